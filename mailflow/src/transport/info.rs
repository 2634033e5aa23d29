//! Per-message summaries listed from a store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mime::{Address, MimeMessage, RecipientType};

/// Summary of a stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeadInfo {
    /// `From` addresses.
    pub from: Vec<String>,
    /// `To` addresses.
    pub to: Vec<String>,
    /// `Cc` addresses.
    pub cc: Vec<String>,
    /// `Subject`.
    pub subject: Option<String>,
    /// Size of the stored message in bytes.
    pub size: usize,
    /// `Message-ID`.
    pub msg_id: Option<String>,
    /// Store-assigned unique id.
    pub uid: String,
    /// `Content-Type` of the body.
    pub content_type: Option<String>,
    /// `Date`, if it parses.
    pub send_date: Option<DateTime<Utc>>,
}

impl MessageHeadInfo {
    /// Summarizes a parsed message. Address headers that fail to parse are
    /// reported as empty lists.
    #[must_use]
    pub fn from_message(uid: impl Into<String>, size: usize, message: &MimeMessage) -> Self {
        let render = |list: Vec<Address>| -> Vec<String> { list.iter().map(ToString::to_string).collect() };
        let recipients = |kind: RecipientType| -> Vec<String> {
            message
                .recipients(kind)
                .ok()
                .flatten()
                .map(render)
                .unwrap_or_default()
        };

        Self {
            from: message.from().map(render).unwrap_or_default(),
            to: recipients(RecipientType::To),
            cc: recipients(RecipientType::Cc),
            subject: message.subject().map(str::to_string),
            size,
            msg_id: message.message_id().map(str::to_string),
            uid: uid.into(),
            content_type: message.header("Content-Type").map(str::to_string),
            send_date: message.sent_date(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use crate::transport::MailSession;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_message() {
        let raw = fixtures::SIMPLE_TEXT.as_bytes();
        let msg = MimeMessage::parse(raw, MailSession::default()).unwrap();
        let info = MessageHeadInfo::from_message("uid-1", raw.len(), &msg);

        assert_eq!(info.uid, "uid-1");
        assert_eq!(info.from, vec!["Sender <sender@example.com>"]);
        assert_eq!(info.to, vec!["a@x.com"]);
        assert!(info.cc.is_empty());
        assert_eq!(info.subject.as_deref(), Some("Hello"));
        assert_eq!(info.msg_id.as_deref(), Some("<simple-1@example.com>"));
        assert!(info.send_date.is_some());
        assert_eq!(info.size, raw.len());
    }

    #[test]
    fn test_serializes() {
        let info = MessageHeadInfo::from_message("u", 0, &MimeMessage::default());
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["uid"], "u");
        assert!(json["subject"].is_null());
    }
}
