//! Body parts of the MIME tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use super::encoding::{decode_charset, encode_charset};
use super::header::HeaderList;
use crate::errors::FormatError;

/// Content type assumed when a part has none.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Stable identity of a body part, assigned on creation.
///
/// Snapshots of a part (clones placed in the context) keep the id, so a
/// part read by one operation can be located in the tree by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(Uuid);

impl PartId {
    /// Allocates a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PartId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Leaf content or ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeNode {
    /// Transfer-decoded bytes.
    Leaf {
        /// Decoded content.
        content: Vec<u8>,
    },
    /// A `multipart/*` container.
    Composite {
        /// Child parts in order.
        children: Vec<BodyPart>,
    },
}

/// One node of the MIME tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    id: PartId,
    headers: HeaderList,
    node: MimeNode,
}

impl BodyPart {
    /// Creates a leaf part with the given headers.
    #[must_use]
    pub fn leaf(headers: HeaderList, content: Vec<u8>) -> Self {
        Self {
            id: PartId::new(),
            headers,
            node: MimeNode::Leaf { content },
        }
    }

    /// Creates a composite part with the given headers.
    #[must_use]
    pub fn composite(headers: HeaderList, children: Vec<Self>) -> Self {
        Self {
            id: PartId::new(),
            headers,
            node: MimeNode::Composite { children },
        }
    }

    /// A `text/<subtype>; charset=utf-8` part.
    #[must_use]
    pub fn text(subtype: &str, text: &str) -> Self {
        let mut headers = HeaderList::new();
        headers.add("Content-Type", format!("text/{subtype}; charset=utf-8"));
        Self::leaf(headers, text.as_bytes().to_vec())
    }

    /// An attachment with a filename.
    #[must_use]
    pub fn attachment(file_name: &str, content_type: &str, content: Vec<u8>) -> Self {
        let file_name = file_name.replace('"', "");
        let mut headers = HeaderList::new();
        headers.add("Content-Type", format!("{content_type}; name=\"{file_name}\""));
        headers.add(
            "Content-Disposition",
            format!("attachment; filename=\"{file_name}\""),
        );
        Self::leaf(headers, content)
    }

    /// A `multipart/<subtype>` container with a fresh boundary.
    #[must_use]
    pub fn multipart(subtype: &str, children: Vec<Self>) -> Self {
        let mut headers = HeaderList::new();
        headers.add(
            "Content-Type",
            format!("multipart/{subtype}; boundary=\"{}\"", new_boundary()),
        );
        Self::composite(headers, children)
    }

    /// Stable identity.
    #[must_use]
    pub fn id(&self) -> PartId {
        self.id
    }

    /// Part headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Mutable part headers.
    pub fn headers_mut(&mut self) -> &mut HeaderList {
        &mut self.headers
    }

    /// Leaf content or children.
    #[must_use]
    pub fn node(&self) -> &MimeNode {
        &self.node
    }

    /// Full `Content-Type` value, defaulting to `text/plain`.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.headers
            .get("Content-Type")
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Lowercase `type/subtype` without parameters.
    #[must_use]
    pub fn mime_type(&self) -> String {
        essence(self.content_type())
    }

    /// A `Content-Type` parameter such as `charset` or `boundary`.
    #[must_use]
    pub fn content_type_param(&self, name: &str) -> Option<String> {
        let parsed = mailparse::parse_content_type(self.content_type());
        parsed.params.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Declared charset.
    #[must_use]
    pub fn charset(&self) -> Option<String> {
        self.content_type_param("charset")
    }

    /// True for `multipart/*` nodes.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        matches!(self.node, MimeNode::Composite { .. })
    }

    /// Main `Content-Disposition` token, lowercased.
    ///
    /// # Errors
    ///
    /// [`FormatError`] when the header is present but its main token is
    /// empty or not an RFC 2045 token.
    pub fn disposition(&self) -> Result<Option<String>, FormatError> {
        let Some(value) = self.headers.get("Content-Disposition") else {
            return Ok(None);
        };
        let token = value.split(';').next().unwrap_or("").trim();
        if token.is_empty() {
            return Err(FormatError::new(
                "disposition",
                format!("empty Content-Disposition '{value}'"),
            ));
        }
        if !token.chars().all(is_token_char) {
            return Err(FormatError::new(
                "disposition",
                format!("'{token}' is not a disposition type"),
            ));
        }
        Ok(Some(token.to_ascii_lowercase()))
    }

    /// Filename from `Content-Disposition`, else the `Content-Type` name.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        self.headers
            .get("Content-Disposition")
            .and_then(|v| mailparse::parse_content_disposition(v).params.get("filename").cloned())
            .or_else(|| self.content_type_param("name"))
            .filter(|name| !name.trim().is_empty())
    }

    /// Decoded leaf bytes.
    #[must_use]
    pub fn content(&self) -> Option<&[u8]> {
        match &self.node {
            MimeNode::Leaf { content } => Some(content),
            MimeNode::Composite { .. } => None,
        }
    }

    /// Replaces leaf content. Turns a composite into a leaf.
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.node = MimeNode::Leaf { content };
    }

    /// Leaf content decoded with the declared charset.
    #[must_use]
    pub fn text_content(&self) -> Option<String> {
        let charset = self.charset();
        self.content()
            .map(|bytes| decode_charset(bytes, charset.as_deref()))
    }

    /// Stores `text` encoded in the declared charset.
    pub fn set_text_content(&mut self, text: &str) {
        let charset = self.charset();
        self.set_content(encode_charset(text, charset.as_deref()));
    }

    /// Children of a composite.
    #[must_use]
    pub fn children(&self) -> Option<&[Self]> {
        match &self.node {
            MimeNode::Composite { children } => Some(children),
            MimeNode::Leaf { .. } => None,
        }
    }

    /// Mutable children of a composite.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.node {
            MimeNode::Composite { children } => Some(children),
            MimeNode::Leaf { .. } => None,
        }
    }

    /// Replaces this node with a composite of the given children.
    pub fn set_children(&mut self, children: Vec<Self>) {
        self.node = MimeNode::Composite { children };
    }

    /// Decoded size in bytes. A composite counts its leaves.
    #[must_use]
    pub fn size(&self) -> usize {
        match &self.node {
            MimeNode::Leaf { content } => content.len(),
            MimeNode::Composite { children } => children.iter().map(Self::size).sum(),
        }
    }
}

/// Lowercase `type/subtype` of a Content-Type value.
#[must_use]
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// A multipart boundary unlikely to occur in content.
#[must_use]
pub fn new_boundary() -> String {
    format!("----=_Part_{}", Uuid::new_v4().simple())
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?=".contains(c)
}

/// Source of a new body part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartSource {
    /// A file attached under its own name.
    File(PathBuf),
    /// An inline `text/plain` part.
    Text(String),
}

/// How body text overrides apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextMode {
    /// Concatenate after the existing text.
    Append,
    /// Substitute the existing text.
    Replace,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_disposition(value: &str) -> BodyPart {
        let mut headers = HeaderList::new();
        headers.add("Content-Type", "application/pdf");
        headers.add("Content-Disposition", value);
        BodyPart::leaf(headers, vec![0; 10])
    }

    #[test]
    fn test_default_content_type() {
        let part = BodyPart::leaf(HeaderList::new(), b"x".to_vec());
        assert_eq!(part.content_type(), "text/plain");
        assert_eq!(part.mime_type(), "text/plain");
    }

    #[test]
    fn test_disposition() {
        assert_eq!(
            with_disposition("ATTACHMENT; filename=\"a.pdf\"").disposition().unwrap(),
            Some("attachment".to_string())
        );
        assert_eq!(BodyPart::text("plain", "x").disposition().unwrap(), None);
    }

    #[test]
    fn test_disposition_unreadable() {
        assert!(with_disposition("; filename=a.pdf").disposition().is_err());
        assert!(with_disposition("attach ment").disposition().is_err());
    }

    #[test]
    fn test_filename_sources() {
        assert_eq!(
            with_disposition("attachment; filename=\"report.pdf\"").filename(),
            Some("report.pdf".to_string())
        );

        let mut headers = HeaderList::new();
        headers.add("Content-Type", "application/pdf; name=\"fallback.pdf\"");
        let part = BodyPart::leaf(headers, Vec::new());
        assert_eq!(part.filename(), Some("fallback.pdf".to_string()));
    }

    #[test]
    fn test_attachment_constructor() {
        let part = BodyPart::attachment("a.txt", "text/plain", b"abc".to_vec());
        assert_eq!(part.disposition().unwrap().as_deref(), Some("attachment"));
        assert_eq!(part.filename().as_deref(), Some("a.txt"));
        assert_eq!(part.size(), 3);
    }

    #[test]
    fn test_composite_size_sums_leaves() {
        let part = BodyPart::multipart(
            "mixed",
            vec![BodyPart::text("plain", "abc"), BodyPart::text("html", "<p>")],
        );
        assert!(part.is_multipart());
        assert_eq!(part.size(), 6);
        assert!(part.content_type_param("boundary").is_some());
    }

    #[test]
    fn test_text_content_uses_charset() {
        let mut headers = HeaderList::new();
        headers.add("Content-Type", "text/plain; charset=ISO-8859-1");
        let mut part = BodyPart::leaf(headers, vec![0x47, 0x72, 0xFC, 0xDF, 0x65]);
        assert_eq!(part.text_content().as_deref(), Some("Grüße"));

        part.set_text_content("Müll");
        assert_eq!(part.content(), Some(&[0x4D, 0xFC, 0x6C, 0x6C][..]));
    }

    #[test]
    fn test_clone_keeps_id() {
        let part = BodyPart::text("plain", "x");
        assert_eq!(part.clone().id(), part.id());
        assert_ne!(BodyPart::text("plain", "x").id(), part.id());
    }
}
