//! Ordered header lists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One header entry. A `None` value is a null header: it is never
/// serialized and never matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    /// Header name as written.
    pub name: String,
    /// Decoded value.
    pub value: Option<String>,
}

impl Header {
    /// Creates a header with a value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a null header.
    #[must_use]
    pub fn null(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}: {value}", self.name),
            None => write!(f, "{}:", self.name),
        }
    }
}

/// Headers in wire order. Names compare case-insensitively; duplicates are
/// kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderList(Vec<Header>);

impl HeaderList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First non-null value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|h| h.is(name))
            .find_map(|h| h.value.as_deref())
    }

    /// Every non-null value for `name`, in order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|h| h.is(name))
            .filter_map(|h| h.value.as_deref())
            .collect()
    }

    /// Returns true if any entry has this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|h| h.is(name))
    }

    /// Replaces every `name` entry with a single one at the position of the
    /// first. `None` removes the header.
    pub fn set(&mut self, name: &str, value: Option<String>) {
        let Some(value) = value else {
            self.remove(name);
            return;
        };
        match self.0.iter().position(|h| h.is(name)) {
            Some(first) => {
                self.0[first].value = Some(value);
                let mut index = 0;
                self.0.retain(|h| {
                    let keep = index == first || !h.is(name);
                    index += 1;
                    keep
                });
            }
            None => self.0.push(Header::new(name, value)),
        }
    }

    /// Appends an entry, keeping existing ones.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Header::new(name, value));
    }

    /// Appends a raw entry.
    pub fn push(&mut self, header: Header) {
        self.0.push(header);
    }

    /// Removes every entry with this name.
    pub fn remove(&mut self, name: &str) {
        self.0.retain(|h| !h.is(name));
    }

    /// Iterates in wire order.
    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Header>> for HeaderList {
    fn from(headers: Vec<Header>) -> Self {
        Self(headers)
    }
}

impl FromIterator<Header> for HeaderList {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> HeaderList {
        let mut headers = HeaderList::new();
        headers.add("Subject", "Hi");
        headers.add("X-Multi-Test", "one");
        headers.add("To", "a@x.com");
        headers.add("X-MULTI-TEST", "two");
        headers
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let headers = sample();
        assert_eq!(headers.get("subject"), Some("Hi"));
        assert_eq!(headers.get_all("x-multi-test"), vec!["one", "two"]);
        assert_eq!(headers.get("Cc"), None);
    }

    #[test]
    fn test_set_collapses_duplicates_in_place() {
        let mut headers = sample();
        headers.set("x-multi-test", Some("only".into()));

        let names: Vec<_> = headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Subject", "X-Multi-Test", "To"]);
        assert_eq!(headers.get("X-Multi-Test"), Some("only"));
    }

    #[test]
    fn test_set_none_removes() {
        let mut headers = sample();
        headers.set("Subject", None);
        assert!(!headers.contains("Subject"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_set_appends_new() {
        let mut headers = sample();
        headers.set("Cc", Some("c@x.com".into()));
        assert_eq!(headers.iter().last().map(|h| h.name.as_str()), Some("Cc"));
    }

    #[test]
    fn test_null_values_skipped() {
        let mut headers = HeaderList::new();
        headers.push(Header::null("X-Empty"));
        headers.add("X-Empty", "v");

        assert_eq!(headers.get("X-Empty"), Some("v"));
        assert_eq!(headers.get_all("X-Empty").len(), 1);
        assert!(headers.contains("x-empty"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Header::new("Subject", "Hi").to_string(), "Subject: Hi");
        assert_eq!(Header::null("X").to_string(), "X:");
    }
}
