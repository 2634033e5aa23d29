//! Sender and recipient operations.

use indexmap::IndexMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::context::{keys, ExecutionContext, ValueKind};
use crate::contracts::Contract;
use crate::errors::{ContractViolation, Result};
use crate::mime::{replace_recipients, set_add_recipients, Address, MimeMessage, RecipientType};
use crate::pipeline::Operation;

/// Types in `mail.recipients.types`, or `[To]` when absent or empty.
fn recipient_types(ctx: &ExecutionContext) -> std::result::Result<Vec<RecipientType>, ContractViolation> {
    Ok(ctx
        .get_opt::<Vec<RecipientType>>(keys::RECIPIENTS_TYPES)?
        .filter(|types| !types.is_empty())
        .cloned()
        .unwrap_or_else(|| vec![RecipientType::To]))
}

static GET_FROM: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .output(keys::FROM, ValueKind::TextList)
});

/// Lists the `From` addresses in `mail.from`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetFrom;

impl Operation for GetFrom {
    fn name(&self) -> &str {
        "get_from"
    }

    fn contract(&self) -> &Contract {
        &GET_FROM
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let from: Vec<String> = ctx
            .get::<MimeMessage>(keys::MIMEMESSAGE)?
            .from()?
            .iter()
            .map(ToString::to_string)
            .collect();
        ctx.insert(keys::FROM, from);
        Ok(())
    }
}

static SET_FROM: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::FROM, ValueKind::Text)
});

/// Replaces `From` with the single address in `mail.from`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetFrom;

impl Operation for SetFrom {
    fn name(&self) -> &str {
        "set_from"
    }

    fn contract(&self) -> &Contract {
        &SET_FROM
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let address = Address::parse(ctx.get::<String>(keys::FROM)?)?;
        ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?.set_from(&address);
        Ok(())
    }
}

static GET_RECIPIENTS: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .optional(keys::RECIPIENTS_TYPES, ValueKind::RecipientTypes, "[To]")
        .output(keys::RECIPIENTS, ValueKind::TextList)
});

/// Lists the recipients of the requested types in `mail.recipients`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetRecipients;

impl Operation for GetRecipients {
    fn name(&self) -> &str {
        "get_recipients"
    }

    fn contract(&self) -> &Contract {
        &GET_RECIPIENTS
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let types = recipient_types(ctx)?;
        let message = ctx.get::<MimeMessage>(keys::MIMEMESSAGE)?;

        let mut recipients = Vec::new();
        for kind in types {
            if let Some(list) = message.recipients(kind)? {
                recipients.extend(list.iter().map(ToString::to_string));
            }
        }
        ctx.insert(keys::RECIPIENTS, recipients);
        Ok(())
    }
}

static REPLACE_RECIPIENTS: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::REPLACERECIPIENTS, ValueKind::TextMap)
        .optional(keys::RECIPIENTS_TYPES, ValueKind::RecipientTypes, "[To]")
        .output(keys::REPLACERECIPIENTS_COUNT, ValueKind::Int)
});

/// Replaces recipients containing each key of `mail.replacerecipients` with
/// the mapped address and reports the number of replacements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceRecipients;

impl Operation for ReplaceRecipients {
    fn name(&self) -> &str {
        "replace_recipients"
    }

    fn contract(&self) -> &Contract {
        &REPLACE_RECIPIENTS
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let types = recipient_types(ctx)?;
        let mapping = ctx
            .get::<IndexMap<String, String>>(keys::REPLACERECIPIENTS)?
            .clone();
        let message = ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?;

        let count = replace_recipients(message, &types, &mapping)?;
        debug!(count, "Replaced recipients");
        ctx.insert(keys::REPLACERECIPIENTS_COUNT, i64::try_from(count).unwrap_or(i64::MAX));
        Ok(())
    }
}

static SET_ADD_RECIPIENTS: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::SETADDRECIPIENTS, ValueKind::RecipientMap)
        .optional(keys::SETADDRECIPIENTS_ADD, ValueKind::Bool, "false")
});

/// Sets (or with `mail.setaddrecipients.add`, appends) recipients per type.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetAddRecipients;

impl Operation for SetAddRecipients {
    fn name(&self) -> &str {
        "set_add_recipients"
    }

    fn contract(&self) -> &Contract {
        &SET_ADD_RECIPIENTS
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let add = ctx
            .get_opt::<bool>(keys::SETADDRECIPIENTS_ADD)?
            .copied()
            .unwrap_or(false);
        let mapping = ctx
            .get::<IndexMap<RecipientType, String>>(keys::SETADDRECIPIENTS)?
            .clone();
        set_add_recipients(ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?, &mapping, add)?;
        Ok(())
    }
}
