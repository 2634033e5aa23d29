//! Subject, Message-ID and generic header operations.

use indexmap::IndexMap;
use std::sync::LazyLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::{keys, ExecutionContext, ValueKind};
use crate::contracts::Contract;
use crate::errors::Result;
use crate::mime::{match_headers, Header, MimeMessage};
use crate::pipeline::Operation;

static GET_SUBJECT: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .output_if_present(keys::SUBJECT, ValueKind::Text)
});

/// Copies the subject into `mail.subject` when the message has one.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetSubject;

impl Operation for GetSubject {
    fn name(&self) -> &str {
        "get_subject"
    }

    fn contract(&self) -> &Contract {
        &GET_SUBJECT
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let subject = ctx
            .get::<MimeMessage>(keys::MIMEMESSAGE)?
            .subject()
            .map(str::to_string);
        if let Some(subject) = subject {
            ctx.insert(keys::SUBJECT, subject);
        }
        Ok(())
    }
}

static SET_SUBJECT: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::SUBJECT, ValueKind::Text)
});

/// Sets the subject from `mail.subject`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetSubject;

impl Operation for SetSubject {
    fn name(&self) -> &str {
        "set_subject"
    }

    fn contract(&self) -> &Contract {
        &SET_SUBJECT
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let subject = ctx.get::<String>(keys::SUBJECT)?.clone();
        ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?
            .set_subject(Some(&subject));
        Ok(())
    }
}

static GET_MESSAGE_ID: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .optional(keys::MESSAGEID_CREATE_IF_NOT_EXISTS, ValueKind::Bool, "false")
        .output_if_present(keys::MESSAGEID, ValueKind::Text)
});

/// Copies the Message-ID into `mail.messageid`, optionally generating one
/// first.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetMessageId;

impl GetMessageId {
    fn generate(message: &MimeMessage) -> String {
        let domain = message
            .from()
            .ok()
            .and_then(|from| from.first().map(|a| a.domain().to_string()))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        format!("<{}@{domain}>", Uuid::new_v4().simple())
    }
}

impl Operation for GetMessageId {
    fn name(&self) -> &str {
        "get_message_id"
    }

    fn contract(&self) -> &Contract {
        &GET_MESSAGE_ID
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let create = ctx
            .get_opt::<bool>(keys::MESSAGEID_CREATE_IF_NOT_EXISTS)?
            .copied()
            .unwrap_or(false);
        let message = ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?;

        let existing = message
            .message_id()
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string);
        let id = match existing {
            Some(id) => Some(id),
            None if create => {
                let id = Self::generate(message);
                message.set_message_id(&id);
                info!(message_id = %id, "Message has no Message-ID; generated one");
                Some(id)
            }
            None => None,
        };

        if let Some(id) = id {
            debug!(message_id = %id, "Message ID");
            ctx.insert(keys::MESSAGEID, id);
        }
        Ok(())
    }
}

static GET_HEADER: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::HEADER_NAMES, ValueKind::TextList)
        .output(keys::HEADER, ValueKind::Headers)
});

/// Collects headers whose names match the patterns in `mail.header.names`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetHeader;

impl Operation for GetHeader {
    fn name(&self) -> &str {
        "get_header"
    }

    fn contract(&self) -> &Contract {
        &GET_HEADER
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let patterns = ctx.get::<Vec<String>>(keys::HEADER_NAMES)?;
        let message = ctx.get::<MimeMessage>(keys::MIMEMESSAGE)?;
        let found = match_headers(message.headers(), patterns)?;
        debug!(patterns = patterns.len(), found = found.len(), "Matched headers");
        ctx.insert(keys::HEADER, found);
        Ok(())
    }
}

static SET_HEADER: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::HEADER, ValueKind::Headers)
});

/// Sets each header in `mail.header`, replacing existing values. A header
/// without a value removes the header.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetHeader;

impl Operation for SetHeader {
    fn name(&self) -> &str {
        "set_header"
    }

    fn contract(&self) -> &Contract {
        &SET_HEADER
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let headers = ctx.get::<Vec<Header>>(keys::HEADER)?.clone();
        let message = ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?;
        for header in headers {
            message.headers_mut().set(&header.name, header.value);
        }
        Ok(())
    }
}

static ADD_HEADER: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::HEADER, ValueKind::TextMap)
});

/// Appends each name/value pair in `mail.header`, keeping existing values.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddHeader;

impl Operation for AddHeader {
    fn name(&self) -> &str {
        "add_header"
    }

    fn contract(&self) -> &Contract {
        &ADD_HEADER
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let headers = ctx.get::<IndexMap<String, String>>(keys::HEADER)?.clone();
        let message = ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?;
        for (name, value) in headers {
            message.headers_mut().add(name, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_format_error, assert_missing, assert_wrong_type, context_with_message, fixtures};
    use pretty_assertions::assert_eq;

    fn message(ctx: &ExecutionContext) -> &MimeMessage {
        ctx.get::<MimeMessage>(keys::MIMEMESSAGE).unwrap()
    }

    #[test]
    fn test_get_subject() {
        let mut ctx = context_with_message(fixtures::ENCODED_TEXT);
        GetSubject.execute(&mut ctx).unwrap();
        assert_eq!(ctx.get::<String>(keys::SUBJECT).unwrap(), "Grüße aus Berlin");
    }

    #[test]
    fn test_get_subject_absent() {
        let mut ctx = ExecutionContext::new().with(keys::MIMEMESSAGE, MimeMessage::default());
        GetSubject.execute(&mut ctx).unwrap();
        assert!(!ctx.contains(keys::SUBJECT));
    }

    #[test]
    fn test_get_subject_missing_message() {
        let mut ctx = ExecutionContext::new();
        let err = GetSubject.execute(&mut ctx).unwrap_err();
        assert_missing(&err, keys::MIMEMESSAGE);
        assert_eq!(
            err.to_string(),
            "[get_subject] mail.mimemessage not exist or is null"
        );
    }

    #[test]
    fn test_set_subject_then_get() {
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT).with(keys::SUBJECT, "Changed");
        SetSubject.and_then(GetSubject).execute(&mut ctx).unwrap();
        assert_eq!(message(&ctx).subject(), Some("Changed"));
        assert_eq!(ctx.get::<String>(keys::SUBJECT).unwrap(), "Changed");
    }

    #[test]
    fn test_set_subject_wrong_kind_leaves_message() {
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT).with(keys::SUBJECT, 42);
        let err = SetSubject.execute(&mut ctx).unwrap_err();
        assert_wrong_type(&err, keys::SUBJECT);
        assert_eq!(message(&ctx).subject(), Some("Hello"));
    }

    #[test]
    fn test_get_message_id_existing() {
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT);
        GetMessageId.execute(&mut ctx).unwrap();
        assert_eq!(ctx.get::<String>(keys::MESSAGEID).unwrap(), "<simple-1@example.com>");
    }

    #[test]
    fn test_get_message_id_absent_without_create() {
        let mut ctx = ExecutionContext::new().with(keys::MIMEMESSAGE, MimeMessage::default());
        GetMessageId.execute(&mut ctx).unwrap();
        assert!(!ctx.contains(keys::MESSAGEID));
        assert_eq!(message(&ctx).message_id(), None);
    }

    #[test]
    fn test_get_message_id_created() {
        let mut ctx = ExecutionContext::new()
            .with(keys::MIMEMESSAGE, MimeMessage::default())
            .with(keys::MESSAGEID_CREATE_IF_NOT_EXISTS, true);
        GetMessageId.execute(&mut ctx).unwrap();

        let id = ctx.get::<String>(keys::MESSAGEID).unwrap().clone();
        assert!(id.starts_with('<') && id.ends_with("@localhost>"));
        assert_eq!(message(&ctx).message_id(), Some(id.as_str()));
    }

    #[test]
    fn test_get_header_patterns() {
        let mut ctx = context_with_message(fixtures::NESTED_MULTIPART)
            .with(keys::HEADER_NAMES, vec!["subject".to_string(), "(to|cc)".to_string()]);
        GetHeader.execute(&mut ctx).unwrap();

        let names: Vec<_> = ctx
            .get::<Vec<Header>>(keys::HEADER)
            .unwrap()
            .iter()
            .map(|h| h.name.clone())
            .collect();
        assert_eq!(names, vec!["To", "Cc", "Subject"]);
    }

    #[test]
    fn test_get_header_repeated_names() {
        let raw = "MIME-Version: 1.0\r\nX-MULTI-TEST: one\r\nX-MULTI-TEST: two\r\nSubject: x\r\n\r\nbody";
        let mut ctx = context_with_message(raw).with(
            keys::HEADER_NAMES,
            vec!["MIME-.*".to_string(), "X-MULTI-TEST".to_string(), "Not-Exist".to_string()],
        );
        GetHeader.execute(&mut ctx).unwrap();

        let found: Vec<_> = ctx
            .get::<Vec<Header>>(keys::HEADER)
            .unwrap()
            .iter()
            .map(|h| (h.name.clone(), h.value.clone().unwrap_or_default()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("MIME-Version".to_string(), "1.0".to_string()),
                ("X-MULTI-TEST".to_string(), "one".to_string()),
                ("X-MULTI-TEST".to_string(), "two".to_string()),
            ]
        );
    }

    #[test]
    fn test_get_header_invalid_pattern() {
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT)
            .with(keys::HEADER_NAMES, vec!["[".to_string()]);
        let err = GetHeader.execute(&mut ctx).unwrap_err();
        assert_format_error(&err, "header pattern");
        assert!(!ctx.contains(keys::HEADER));
    }

    #[test]
    fn test_set_header_replaces_and_removes() {
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT).with(
            keys::HEADER,
            vec![Header::new("Subject", "New"), Header::null("Message-ID"), Header::new("X-Tag", "1")],
        );
        SetHeader.execute(&mut ctx).unwrap();

        let msg = message(&ctx);
        assert_eq!(msg.headers().get_all("Subject"), vec!["New"]);
        assert_eq!(msg.message_id(), None);
        assert_eq!(msg.header("X-Tag"), Some("1"));
    }

    #[test]
    fn test_add_header_appends() {
        let mut map = IndexMap::new();
        map.insert("Subject".to_string(), "Second".to_string());
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT).with(keys::HEADER, map);
        AddHeader.execute(&mut ctx).unwrap();

        assert_eq!(message(&ctx).headers().get_all("Subject"), vec!["Hello", "Second"]);
    }

    #[test]
    fn test_add_header_rejects_header_list() {
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT)
            .with(keys::HEADER, vec![Header::new("X", "1")]);
        let err = AddHeader.execute(&mut ctx).unwrap_err();
        assert_wrong_type(&err, keys::HEADER);
    }
}
