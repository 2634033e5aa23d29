//! Mail addresses and recipient types.

use mailparse::{MailAddr, SingleInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::FormatError;

/// An RFC 5322 mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Optional phrase shown before the angle-addr.
    pub display_name: Option<String>,
    /// `local@domain`.
    pub email: String,
}

impl Address {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            display_name: None,
            email: email.into(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Parses exactly one mailbox, rejecting anything without `local@domain`.
    ///
    /// # Errors
    ///
    /// [`FormatError`] for empty input, more than one address, or a mailbox
    /// lacking a local part or domain.
    pub fn parse(input: &str) -> Result<Self, FormatError> {
        let mut list = Self::parse_list(input)?;
        match list.len() {
            0 => Err(FormatError::new("address", "Empty address")),
            1 => Ok(list.remove(0)),
            n => Err(FormatError::new(
                "address",
                format!("Expected one address, found {n} in '{input}'"),
            )),
        }
    }

    /// Parses a comma-separated address list. Group members are flattened.
    /// Blank input yields an empty list.
    ///
    /// # Errors
    ///
    /// [`FormatError`] if any entry is not a valid mailbox.
    pub fn parse_list(input: &str) -> Result<Vec<Self>, FormatError> {
        if input.trim().is_empty() {
            return Ok(Vec::new());
        }
        if !input.contains('@') {
            return Err(FormatError::new(
                "address",
                format!("Missing final '@domain' in '{}'", input.trim()),
            ));
        }
        let parsed = mailparse::addrparse(input)
            .map_err(|e| FormatError::new("address", format!("{e} in '{input}'")))?;

        let mut out = Vec::new();
        for entry in parsed.iter() {
            match entry {
                MailAddr::Single(info) => out.push(Self::from_info(info)?),
                MailAddr::Group(group) => {
                    for info in &group.addrs {
                        out.push(Self::from_info(info)?);
                    }
                }
            }
        }
        Ok(out)
    }

    fn from_info(info: &SingleInfo) -> Result<Self, FormatError> {
        let email = info.addr.trim();
        validate_addr_spec(email)?;
        Ok(Self {
            display_name: info
                .display_name
                .as_ref()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            email: email.to_string(),
        })
    }

    /// Domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.email.rsplit_once('@').map_or("", |(_, d)| d)
    }
}

fn validate_addr_spec(email: &str) -> Result<(), FormatError> {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return Err(FormatError::new(
            "address",
            format!("Missing final '@domain' in '{email}'"),
        ));
    };
    if local.is_empty() {
        return Err(FormatError::new("address", format!("Missing local part in '{email}'")));
    }
    if domain.is_empty() {
        return Err(FormatError::new(
            "address",
            format!("Missing final '@domain' in '{email}'"),
        ));
    }
    if email.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
        return Err(FormatError::new(
            "address",
            format!("Illegal character in '{email}'"),
        ));
    }
    Ok(())
}

const SPECIALS: &[char] = &['(', ')', '<', '>', '[', ']', ':', ';', '@', '\\', ',', '.', '"'];

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            None => f.write_str(&self.email),
            Some(name) if name.contains(SPECIALS) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.email)
            }
            Some(name) => write!(f, "{name} <{}>", self.email),
        }
    }
}

impl FromStr for Address {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Joins addresses into a header value.
#[must_use]
pub fn format_list(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which recipient header an address list lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecipientType {
    /// `To`
    To,
    /// `Cc`
    Cc,
    /// `Bcc`
    Bcc,
}

impl RecipientType {
    /// All types in header order.
    pub const ALL: [Self; 3] = [Self::To, Self::Cc, Self::Bcc];

    /// The header name.
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::To => "To",
            Self::Cc => "Cc",
            Self::Bcc => "Bcc",
        }
    }
}

impl fmt::Display for RecipientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_name())
    }
}

impl FromStr for RecipientType {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.header_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FormatError::new("recipient type", s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_plain() {
        let addr = Address::parse("a@x.com").unwrap();
        assert_eq!(addr, Address::new("a@x.com"));
        assert_eq!(addr.domain(), "x.com");
    }

    #[test]
    fn test_parse_with_display_name() {
        let addr = Address::parse("Max Mustermann <max@test.de>").unwrap();
        assert_eq!(addr.display_name.as_deref(), Some("Max Mustermann"));
        assert_eq!(addr.email, "max@test.de");
        assert_eq!(addr.to_string(), "Max Mustermann <max@test.de>");
    }

    #[test]
    fn test_parse_missing_domain() {
        let err = Address::parse("notanaddress").unwrap_err();
        assert!(err.message.contains("Missing final '@domain'"));
    }

    #[test]
    fn test_parse_rejects_two() {
        assert!(Address::parse("a@x.com, b@y.com").is_err());
    }

    #[test]
    fn test_parse_list() {
        let list = Address::parse_list("a@x.com, \"Doe, Jane\" <jane@y.com>").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].display_name.as_deref(), Some("Doe, Jane"));
        assert_eq!(list[1].to_string(), "\"Doe, Jane\" <jane@y.com>");
    }

    #[test]
    fn test_parse_list_blank() {
        assert!(Address::parse_list("  ").unwrap().is_empty());
    }

    #[test]
    fn test_format_list() {
        let list = vec![Address::new("a@x.com"), Address::new("b@y.com")];
        assert_eq!(format_list(&list), "a@x.com, b@y.com");
    }

    #[test]
    fn test_recipient_type_from_str() {
        assert_eq!("cc".parse::<RecipientType>().unwrap(), RecipientType::Cc);
        assert!("Reply-To".parse::<RecipientType>().is_err());
        assert_eq!(RecipientType::Bcc.to_string(), "Bcc");
    }
}
