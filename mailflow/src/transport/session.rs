//! Mail session properties.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Host of the submission server.
pub const SMTP_HOST: &str = "mail.smtp.host";
/// Port of the submission server.
pub const SMTP_PORT: &str = "mail.smtp.port";
/// `"true"` to upgrade the submission connection with STARTTLS.
pub const SMTP_STARTTLS: &str = "mail.smtp.starttls.enable";
/// Protocol of the message store.
pub const STORE_PROTOCOL: &str = "mail.store.protocol";

/// Insertion-ordered session properties such as `mail.smtp.host`.
///
/// Every message carries a session; an empty one is the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MailSession {
    props: IndexMap<String, String>,
}

impl MailSession {
    /// An empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A session over the given properties.
    #[must_use]
    pub fn from_props(props: IndexMap<String, String>) -> Self {
        Self { props }
    }

    /// Reads properties from a JSON object. Non-string values are stored in
    /// their JSON rendering, so `{"mail.smtp.port": 25}` is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a JSON object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: IndexMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let props = raw
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();
        Ok(Self { props })
    }

    /// Adds or replaces a property.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// A property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    /// Adds or replaces a property.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.props.insert(key.into(), value.into());
    }

    /// True if the property is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }

    /// All properties.
    #[must_use]
    pub fn props(&self) -> &IndexMap<String, String> {
        &self.props
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// True when no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// `mail.smtp.host`, if non-blank.
    #[must_use]
    pub fn smtp_host(&self) -> Option<&str> {
        self.get(SMTP_HOST).filter(|h| !h.trim().is_empty())
    }

    /// `mail.smtp.port`, if it parses.
    #[must_use]
    pub fn smtp_port(&self) -> Option<u16> {
        self.get(SMTP_PORT).and_then(|p| p.trim().parse().ok())
    }

    /// Whether STARTTLS is enabled.
    #[must_use]
    pub fn starttls(&self) -> bool {
        self.get(SMTP_STARTTLS)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// `mail.store.protocol`, defaulting to `pop3`.
    #[must_use]
    pub fn store_protocol(&self) -> &str {
        self.get(STORE_PROTOCOL).unwrap_or("pop3")
    }
}

impl From<IndexMap<String, String>> for MailSession {
    fn from(props: IndexMap<String, String>) -> Self {
        Self::from_props(props)
    }
}
