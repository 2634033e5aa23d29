//! Creating sessions and messages.

use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;

use crate::context::{keys, ExecutionContext, ValueKind};
use crate::contracts::Contract;
use crate::errors::Result;
use crate::mime::MimeMessage;
use crate::pipeline::Operation;
use crate::transport::MailSession;

static GET_SESSION: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::SESSION_PROPS, ValueKind::TextMap)
        .output(keys::SESSION, ValueKind::Session)
});

/// Builds a [`MailSession`] from `mail.session.props`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetSession;

impl Operation for GetSession {
    fn name(&self) -> &str {
        "get_session"
    }

    fn contract(&self) -> &Contract {
        &GET_SESSION
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let props = ctx.get::<IndexMap<String, String>>(keys::SESSION_PROPS)?.clone();
        debug!(props = props.len(), "Created mail session");
        ctx.insert(keys::SESSION, MailSession::from_props(props));
        Ok(())
    }
}

static GET_MIME_MESSAGE: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .optional(keys::FILE, ValueKind::Path, "none")
        .optional(keys::STREAM, ValueKind::Bytes, "none")
        .optional(keys::SESSION, ValueKind::Session, "empty session")
        .output(keys::MIMEMESSAGE, ValueKind::Message)
});

/// Parses a message from `mail.file` or `mail.stream`, or creates an empty
/// one. The file wins when both are set.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetMimeMessage;

impl Operation for GetMimeMessage {
    fn name(&self) -> &str {
        "get_mime_message"
    }

    fn contract(&self) -> &Contract {
        &GET_MIME_MESSAGE
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let session = ctx
            .get_opt::<MailSession>(keys::SESSION)?
            .cloned()
            .unwrap_or_default();

        let message = if let Some(path) = ctx.get_opt::<PathBuf>(keys::FILE)? {
            debug!(file = %path.display(), "Create message from file");
            MimeMessage::parse(&std::fs::read(path)?, session)?
        } else if let Some(bytes) = ctx.get_opt::<Vec<u8>>(keys::STREAM)? {
            debug!(bytes = bytes.len(), "Create message from stream");
            MimeMessage::parse(bytes, session)?
        } else {
            debug!("Create empty message");
            MimeMessage::new(session)
        };

        ctx.insert(keys::MIMEMESSAGE, message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_wrong_type, fixtures};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_get_session() {
        let mut props = IndexMap::new();
        props.insert("mail.smtp.host".to_string(), "smtp.test".to_string());
        let mut ctx = ExecutionContext::new().with(keys::SESSION_PROPS, props);

        GetSession.execute(&mut ctx).unwrap();
        let session = ctx.get::<MailSession>(keys::SESSION).unwrap();
        assert_eq!(session.smtp_host(), Some("smtp.test"));
    }

    #[test]
    fn test_get_session_wrong_kind() {
        let mut ctx = ExecutionContext::new().with(keys::SESSION_PROPS, "host=x");
        let err = GetSession.execute(&mut ctx).unwrap_err();
        assert_wrong_type(&err, keys::SESSION_PROPS);
        assert!(!ctx.contains(keys::SESSION));
    }

    #[test]
    fn test_empty_message_by_default() {
        let mut ctx = ExecutionContext::new();
        GetMimeMessage.execute(&mut ctx).unwrap();

        let msg = ctx.get::<MimeMessage>(keys::MIMEMESSAGE).unwrap();
        assert!(msg.headers().is_empty());
        assert!(msg.session().is_empty());
    }

    #[test]
    fn test_from_stream_with_session() {
        let session = MailSession::new().with("mail.smtp.host", "h");
        let mut ctx = ExecutionContext::new()
            .with(keys::STREAM, fixtures::SIMPLE_TEXT.as_bytes().to_vec())
            .with(keys::SESSION, session.clone());

        GetMimeMessage.execute(&mut ctx).unwrap();
        let msg = ctx.get::<MimeMessage>(keys::MIMEMESSAGE).unwrap();
        assert_eq!(msg.subject(), Some("Hello"));
        assert_eq!(msg.session(), &session);
    }

    #[test]
    fn test_file_wins_over_stream() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(fixtures::NESTED_MULTIPART.as_bytes()).unwrap();

        let mut ctx = ExecutionContext::new()
            .with(keys::FILE, file.path().to_path_buf())
            .with(keys::STREAM, fixtures::SIMPLE_TEXT.as_bytes().to_vec());

        GetMimeMessage.execute(&mut ctx).unwrap();
        assert_eq!(
            ctx.get::<MimeMessage>(keys::MIMEMESSAGE).unwrap().subject(),
            Some("Report")
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut ctx = ExecutionContext::new().with(keys::FILE, PathBuf::from("/nonexistent/mail.eml"));
        let err = GetMimeMessage.execute(&mut ctx).unwrap_err();
        assert!(matches!(err, crate::MailflowError::Io(_)));
    }
}
