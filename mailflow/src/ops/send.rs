//! Message submission.

use std::sync::{Arc, LazyLock};
use tracing::info;

use crate::context::{keys, ExecutionContext, ValueKind};
use crate::contracts::Contract;
use crate::errors::{ContractViolation, Result};
use crate::mime::{Address, MimeMessage};
use crate::pipeline::Operation;
use crate::transport::{Credentials, MailSender, SendEnvelope};

static SEND_MESSAGE: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .optional(keys::SENDMESSAGE_ADDRESSES, ValueKind::Addresses, "message recipients")
        .optional(keys::SENDMESSAGE_USER, ValueKind::Text, "none")
        .optional(keys::SENDMESSAGE_PASSWORD, ValueKind::Text, "none")
});

/// Sends the message through the injected [`MailSender`].
///
/// Envelope recipients are `mail.sendmessage.addresses` when set, otherwise
/// every `To`, `Cc` and `Bcc` address. The message session must name an
/// SMTP host.
#[derive(Clone)]
pub struct SendMessage {
    sender: Arc<dyn MailSender>,
}

impl SendMessage {
    /// Creates the operation over `sender`.
    #[must_use]
    pub fn new(sender: Arc<dyn MailSender>) -> Self {
        Self { sender }
    }

    fn credentials(ctx: &ExecutionContext) -> Result<Option<Credentials>> {
        let user = ctx.get_opt::<String>(keys::SENDMESSAGE_USER)?;
        let password = ctx.get_opt::<String>(keys::SENDMESSAGE_PASSWORD)?;
        Ok(match (user, password) {
            (Some(user), Some(password)) if !user.trim().is_empty() && !password.trim().is_empty() => {
                Some(Credentials::new(user, password))
            }
            _ => None,
        })
    }
}

impl std::fmt::Debug for SendMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendMessage").finish_non_exhaustive()
    }
}

impl Operation for SendMessage {
    fn name(&self) -> &str {
        "send_message"
    }

    fn contract(&self) -> &Contract {
        &SEND_MESSAGE
    }

    fn check(&self, ctx: &ExecutionContext) -> std::result::Result<(), ContractViolation> {
        if ctx
            .get_opt::<Vec<Address>>(keys::SENDMESSAGE_ADDRESSES)?
            .is_some_and(Vec::is_empty)
        {
            return Err(ContractViolation::precondition(
                keys::SENDMESSAGE_ADDRESSES,
                "is an empty list",
            ));
        }
        if ctx.get::<MimeMessage>(keys::MIMEMESSAGE)?.session().smtp_host().is_none() {
            return Err(ContractViolation::precondition(
                keys::MIMEMESSAGE,
                "session has no mail.smtp.host",
            ));
        }
        Ok(())
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let message = ctx.get::<MimeMessage>(keys::MIMEMESSAGE)?;
        let recipients = match ctx.get_opt::<Vec<Address>>(keys::SENDMESSAGE_ADDRESSES)? {
            Some(addresses) => addresses.clone(),
            None => message.all_recipients()?,
        };
        let envelope = SendEnvelope {
            sender: message.from()?.into_iter().next(),
            recipients,
            credentials: Self::credentials(ctx)?,
        };

        self.sender.send(message, &envelope)?;
        info!(
            recipients = envelope.recipients.len(),
            authenticated = envelope.credentials.is_some(),
            "Message handed to sender"
        );
        Ok(())
    }
}
