//! A parsed message: session plus root body part.

use chrono::{DateTime, TimeZone, Utc};

use super::address::{format_list, Address, RecipientType};
use super::codec::parse_message;
use super::header::HeaderList;
use super::part::{new_boundary, BodyPart};
use super::writer::{write_message, WriteOptions};
use crate::errors::FormatError;
use crate::transport::MailSession;

/// An RFC 5322 message.
///
/// The root part's headers are the message headers; its node is the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeMessage {
    session: MailSession,
    root: BodyPart,
}

impl Default for MimeMessage {
    fn default() -> Self {
        Self::new(MailSession::default())
    }
}

impl MimeMessage {
    /// An empty message bound to `session`.
    #[must_use]
    pub fn new(session: MailSession) -> Self {
        Self {
            session,
            root: BodyPart::leaf(HeaderList::new(), Vec::new()),
        }
    }

    /// Wraps an existing root part.
    #[must_use]
    pub fn from_root(session: MailSession, root: BodyPart) -> Self {
        Self { session, root }
    }

    /// Parses RFC 5322 bytes.
    ///
    /// # Errors
    ///
    /// [`FormatError`] if the bytes are not a message.
    pub fn parse(bytes: &[u8], session: MailSession) -> Result<Self, FormatError> {
        parse_message(bytes, session)
    }

    /// Serializes with every header, including `Bcc`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        write_message(self, &WriteOptions::default())
    }

    /// The session the message belongs to.
    #[must_use]
    pub fn session(&self) -> &MailSession {
        &self.session
    }

    /// Mutable session.
    pub fn session_mut(&mut self) -> &mut MailSession {
        &mut self.session
    }

    /// Root body part.
    #[must_use]
    pub fn root(&self) -> &BodyPart {
        &self.root
    }

    /// Mutable root body part.
    pub fn root_mut(&mut self) -> &mut BodyPart {
        &mut self.root
    }

    /// Message headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderList {
        self.root.headers()
    }

    /// Mutable message headers.
    pub fn headers_mut(&mut self) -> &mut HeaderList {
        self.root.headers_mut()
    }

    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name)
    }

    /// Full `Content-Type` of the body.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.root.content_type()
    }

    /// True when the body is `multipart/*`.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.root.is_multipart()
    }

    /// Top-level parts of a multipart body.
    #[must_use]
    pub fn parts(&self) -> Option<&[BodyPart]> {
        self.root.children()
    }

    /// Mutable top-level parts of a multipart body.
    pub fn parts_mut(&mut self) -> Option<&mut Vec<BodyPart>> {
        self.root.children_mut()
    }

    /// Replaces the body with a `multipart/<subtype>` of `children`.
    pub fn set_multipart(&mut self, subtype: &str, children: Vec<BodyPart>) {
        let headers = self.root.headers_mut();
        headers.set(
            "Content-Type",
            Some(format!("multipart/{subtype}; boundary=\"{}\"", new_boundary())),
        );
        headers.remove("Content-Disposition");
        self.root.set_children(children);
    }

    /// Decoded body size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.root.size()
    }

    /// `Subject` header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.header("Subject")
    }

    /// Sets or clears `Subject`.
    pub fn set_subject(&mut self, subject: Option<&str>) {
        self.headers_mut().set("Subject", subject.map(str::to_string));
    }

    /// `Message-ID` header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.header("Message-ID")
    }

    /// Sets `Message-ID`.
    pub fn set_message_id(&mut self, id: &str) {
        self.headers_mut().set("Message-ID", Some(id.to_string()));
    }

    /// `Date` header, if it parses.
    #[must_use]
    pub fn sent_date(&self) -> Option<DateTime<Utc>> {
        let value = self.header("Date")?;
        let ts = mailparse::dateparse(value).ok()?;
        Utc.timestamp_opt(ts, 0).single()
    }

    /// Addresses of `From`; empty when the header is absent.
    ///
    /// # Errors
    ///
    /// [`FormatError`] if the header does not parse.
    pub fn from(&self) -> Result<Vec<Address>, FormatError> {
        self.header("From")
            .map_or_else(|| Ok(Vec::new()), Address::parse_list)
    }

    /// Replaces `From` with a single address.
    pub fn set_from(&mut self, address: &Address) {
        self.headers_mut().set("From", Some(address.to_string()));
    }

    /// Addresses of one recipient header; `None` when it is absent.
    ///
    /// # Errors
    ///
    /// [`FormatError`] if the header does not parse.
    pub fn recipients(&self, kind: RecipientType) -> Result<Option<Vec<Address>>, FormatError> {
        self.header(kind.header_name())
            .map(Address::parse_list)
            .transpose()
    }

    /// `To`, `Cc` and `Bcc` addresses in that order.
    ///
    /// # Errors
    ///
    /// [`FormatError`] if a header does not parse.
    pub fn all_recipients(&self) -> Result<Vec<Address>, FormatError> {
        let mut all = Vec::new();
        for kind in RecipientType::ALL {
            if let Some(list) = self.recipients(kind)? {
                all.extend(list);
            }
        }
        Ok(all)
    }

    /// Replaces a recipient header. An empty list removes it.
    pub fn set_recipients(&mut self, kind: RecipientType, addresses: &[Address]) {
        let value = (!addresses.is_empty()).then(|| format_list(addresses));
        self.headers_mut().set(kind.header_name(), value);
    }

    /// Appends to a recipient header.
    ///
    /// # Errors
    ///
    /// [`FormatError`] if the existing header does not parse.
    pub fn add_recipients(
        &mut self,
        kind: RecipientType,
        addresses: &[Address],
    ) -> Result<(), FormatError> {
        let mut list = self.recipients(kind)?.unwrap_or_default();
        list.extend_from_slice(addresses);
        self.set_recipients(kind, &list);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message() -> MimeMessage {
        let mut msg = MimeMessage::default();
        msg.headers_mut().add("Subject", "Hello");
        msg.headers_mut().add("To", "a@x.com");
        msg.headers_mut().add("Date", "Tue, 1 Jul 2003 10:52:37 +0200");
        msg
    }

    #[test]
    fn test_empty_message() {
        let msg = MimeMessage::default();
        assert!(msg.headers().is_empty());
        assert!(!msg.is_multipart());
        assert_eq!(msg.size(), 0);
        assert!(msg.from().unwrap().is_empty());
    }

    #[test]
    fn test_subject_round_trip() {
        let mut msg = message();
        assert_eq!(msg.subject(), Some("Hello"));
        msg.set_subject(Some("Changed"));
        assert_eq!(msg.subject(), Some("Changed"));
        msg.set_subject(None);
        assert_eq!(msg.subject(), None);
    }

    #[test]
    fn test_recipients_absent_vs_present() {
        let msg = message();
        assert_eq!(msg.recipients(RecipientType::Cc).unwrap(), None);
        assert_eq!(
            msg.recipients(RecipientType::To).unwrap(),
            Some(vec![Address::new("a@x.com")])
        );
    }

    #[test]
    fn test_add_and_set_recipients() {
        let mut msg = message();
        msg.add_recipients(RecipientType::To, &[Address::new("b@y.com")]).unwrap();
        assert_eq!(msg.header("To"), Some("a@x.com, b@y.com"));

        msg.set_recipients(RecipientType::To, &[]);
        assert_eq!(msg.header("To"), None);
    }

    #[test]
    fn test_all_recipients_order() {
        let mut msg = message();
        msg.headers_mut().add("Bcc", "hidden@z.com");
        msg.headers_mut().add("Cc", "c@x.com");

        let all: Vec<_> = msg.all_recipients().unwrap().into_iter().map(|a| a.email).collect();
        assert_eq!(all, vec!["a@x.com", "c@x.com", "hidden@z.com"]);
    }

    #[test]
    fn test_sent_date() {
        let date = message().sent_date().unwrap();
        assert_eq!(date.to_rfc3339(), "2003-07-01T08:52:37+00:00");
    }

    #[test]
    fn test_set_multipart() {
        let mut msg = message();
        msg.set_multipart("mixed", vec![BodyPart::text("plain", "hi")]);

        assert!(msg.is_multipart());
        assert!(msg.content_type().starts_with("multipart/mixed; boundary="));
        assert_eq!(msg.parts().map(<[BodyPart]>::len), Some(1));
    }
}
