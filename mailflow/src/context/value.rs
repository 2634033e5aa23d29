//! Tagged values stored in an [`ExecutionContext`](super::ExecutionContext).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::mime::{Address, BodyPart, Header, MimeMessage, PartSource, RecipientType, TextMode};
use crate::transport::{FolderMode, MailSession, MessageFlag, MessageHeadInfo};

/// A value held under a context key.
///
/// Each variant is one documented shape; operations extract values by
/// pattern matching through [`ContextType`] instead of downcasting.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// A flag.
    Bool(bool),
    /// An integer (sizes, counts).
    Int(i64),
    /// A string.
    Text(String),
    /// A filesystem path.
    Path(PathBuf),
    /// Raw bytes, e.g. an RFC 5322 message stream.
    Bytes(Vec<u8>),
    /// Ordered strings.
    TextList(Vec<String>),
    /// Insertion-ordered string mapping.
    TextMap(IndexMap<String, String>),
    /// Mail session properties.
    Session(MailSession),
    /// A parsed message.
    Message(MimeMessage),
    /// Several parsed messages.
    Messages(Vec<MimeMessage>),
    /// Ordered header entries.
    Headers(Vec<Header>),
    /// Body parts (snapshots carrying their part ids).
    Parts(Vec<BodyPart>),
    /// Sources for new body parts.
    PartSources(Vec<PartSource>),
    /// Parsed addresses.
    Addresses(Vec<Address>),
    /// Recipient types to scan.
    RecipientTypes(Vec<RecipientType>),
    /// Recipient type to comma-separated address string.
    RecipientMap(IndexMap<RecipientType, String>),
    /// Message flags.
    Flags(Vec<MessageFlag>),
    /// Folder open mode.
    FolderMode(FolderMode),
    /// Body text edit mode.
    TextMode(TextMode),
    /// Per-message summaries.
    MessageInfos(Vec<MessageHeadInfo>),
}

/// The shape tag of a [`ContextValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// [`ContextValue::Bool`]
    Bool,
    /// [`ContextValue::Int`]
    Int,
    /// [`ContextValue::Text`]
    Text,
    /// [`ContextValue::Path`]
    Path,
    /// [`ContextValue::Bytes`]
    Bytes,
    /// [`ContextValue::TextList`]
    TextList,
    /// [`ContextValue::TextMap`]
    TextMap,
    /// [`ContextValue::Session`]
    Session,
    /// [`ContextValue::Message`]
    Message,
    /// [`ContextValue::Messages`]
    Messages,
    /// [`ContextValue::Headers`]
    Headers,
    /// [`ContextValue::Parts`]
    Parts,
    /// [`ContextValue::PartSources`]
    PartSources,
    /// [`ContextValue::Addresses`]
    Addresses,
    /// [`ContextValue::RecipientTypes`]
    RecipientTypes,
    /// [`ContextValue::RecipientMap`]
    RecipientMap,
    /// [`ContextValue::Flags`]
    Flags,
    /// [`ContextValue::FolderMode`]
    FolderMode,
    /// [`ContextValue::TextMode`]
    TextMode,
    /// [`ContextValue::MessageInfos`]
    MessageInfos,
}

impl ValueKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Text => "text",
            Self::Path => "path",
            Self::Bytes => "bytes",
            Self::TextList => "text_list",
            Self::TextMap => "text_map",
            Self::Session => "session",
            Self::Message => "message",
            Self::Messages => "messages",
            Self::Headers => "headers",
            Self::Parts => "parts",
            Self::PartSources => "part_sources",
            Self::Addresses => "addresses",
            Self::RecipientTypes => "recipient_types",
            Self::RecipientMap => "recipient_map",
            Self::Flags => "flags",
            Self::FolderMode => "folder_mode",
            Self::TextMode => "text_mode",
            Self::MessageInfos => "message_infos",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ContextValue {
    /// Returns the shape tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Text(_) => ValueKind::Text,
            Self::Path(_) => ValueKind::Path,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::TextList(_) => ValueKind::TextList,
            Self::TextMap(_) => ValueKind::TextMap,
            Self::Session(_) => ValueKind::Session,
            Self::Message(_) => ValueKind::Message,
            Self::Messages(_) => ValueKind::Messages,
            Self::Headers(_) => ValueKind::Headers,
            Self::Parts(_) => ValueKind::Parts,
            Self::PartSources(_) => ValueKind::PartSources,
            Self::Addresses(_) => ValueKind::Addresses,
            Self::RecipientTypes(_) => ValueKind::RecipientTypes,
            Self::RecipientMap(_) => ValueKind::RecipientMap,
            Self::Flags(_) => ValueKind::Flags,
            Self::FolderMode(_) => ValueKind::FolderMode,
            Self::TextMode(_) => ValueKind::TextMode,
            Self::MessageInfos(_) => ValueKind::MessageInfos,
        }
    }

    /// A short JSON rendering used in logs and event payloads.
    ///
    /// Scalars are rendered as-is; domain objects as their kind and length.
    #[must_use]
    pub fn summary(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::json!(b),
            Self::Int(i) => serde_json::json!(i),
            Self::Text(s) => serde_json::json!(s),
            Self::Path(p) => serde_json::json!(p.display().to_string()),
            Self::TextList(v) => serde_json::json!(v),
            Self::Bytes(b) => serde_json::json!({"kind": "bytes", "len": b.len()}),
            Self::Messages(v) => serde_json::json!({"kind": "messages", "len": v.len()}),
            Self::Parts(v) => serde_json::json!({"kind": "parts", "len": v.len()}),
            Self::Headers(v) => serde_json::json!({"kind": "headers", "len": v.len()}),
            other => serde_json::json!({"kind": other.kind().as_str()}),
        }
    }
}

/// A Rust type stored under exactly one [`ContextValue`] variant.
pub trait ContextType: Sized {
    /// The variant this type maps to.
    const KIND: ValueKind;

    /// Borrows the payload if `value` has this type's variant.
    fn from_value(value: &ContextValue) -> Option<&Self>;

    /// Mutably borrows the payload if `value` has this type's variant.
    fn from_value_mut(value: &mut ContextValue) -> Option<&mut Self>;

    /// Wraps into the variant.
    fn into_value(self) -> ContextValue;
}

macro_rules! context_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ContextType for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn from_value(value: &ContextValue) -> Option<&Self> {
                    match value {
                        ContextValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn from_value_mut(value: &mut ContextValue) -> Option<&mut Self> {
                    match value {
                        ContextValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn into_value(self) -> ContextValue {
                    ContextValue::$variant(self)
                }
            }

            impl From<$ty> for ContextValue {
                fn from(value: $ty) -> Self {
                    ContextValue::$variant(value)
                }
            }
        )*
    };
}

context_type! {
    bool => Bool,
    i64 => Int,
    String => Text,
    PathBuf => Path,
    Vec<u8> => Bytes,
    Vec<String> => TextList,
    IndexMap<String, String> => TextMap,
    MailSession => Session,
    MimeMessage => Message,
    Vec<MimeMessage> => Messages,
    Vec<Header> => Headers,
    Vec<BodyPart> => Parts,
    Vec<PartSource> => PartSources,
    Vec<Address> => Addresses,
    Vec<RecipientType> => RecipientTypes,
    IndexMap<RecipientType, String> => RecipientMap,
    Vec<MessageFlag> => Flags,
    FolderMode => FolderMode,
    TextMode => TextMode,
    Vec<MessageHeadInfo> => MessageInfos,
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}
