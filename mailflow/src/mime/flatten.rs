//! Depth-first flattening of the MIME tree with part filters.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::message::MimeMessage;
use super::part::BodyPart;
use crate::errors::FormatError;

/// Conjunctive part filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartFilter {
    /// Keep parts larger than this many kB. `<= 0` disables the check.
    pub min_size_kb: i64,
    /// Keep parts with this disposition, compared case-insensitively.
    pub disposition: Option<String>,
}

impl PartFilter {
    /// A filter that keeps everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size floor in kB.
    #[must_use]
    pub fn with_min_size_kb(mut self, kb: i64) -> Self {
        self.min_size_kb = kb;
        self
    }

    /// Sets the disposition to keep.
    #[must_use]
    pub fn with_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.disposition = Some(disposition.into());
        self
    }

    /// True when `part` passes both checks.
    ///
    /// # Errors
    ///
    /// [`FormatError`] if the disposition filter is set and the part's
    /// disposition header cannot be read.
    pub fn matches(&self, part: &BodyPart) -> Result<bool, FormatError> {
        if self.min_size_kb > 0 {
            let floor = u64::try_from(self.min_size_kb)
                .unwrap_or(u64::MAX)
                .saturating_mul(1024);
            if part.size() as u64 <= floor {
                return Ok(false);
            }
        }
        if let Some(wanted) = &self.disposition {
            return Ok(part
                .disposition()?
                .is_some_and(|d| d.eq_ignore_ascii_case(wanted)));
        }
        Ok(true)
    }
}

/// Collects the parts of a multipart message depth-first.
///
/// A composite child is listed after its own descendants. A message that is
/// not multipart yields an empty list.
///
/// # Errors
///
/// [`FormatError`] if a part's disposition cannot be read while filtering.
pub fn flatten_parts(message: &MimeMessage, filter: &PartFilter) -> Result<Vec<BodyPart>, FormatError> {
    let Some(children) = message.parts() else {
        warn!(content_type = %message.content_type(), "Message is not multipart; no parts collected");
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    collect(children, filter, &mut out)?;
    debug!(count = out.len(), "Collected body parts");
    Ok(out)
}

fn collect(children: &[BodyPart], filter: &PartFilter, out: &mut Vec<BodyPart>) -> Result<(), FormatError> {
    for child in children {
        if let Some(grandchildren) = child.children() {
            collect(grandchildren, filter, out)?;
        }
        if filter.matches(child)? {
            out.push(child.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::HeaderList;
    use pretty_assertions::assert_eq;

    fn tree() -> MimeMessage {
        let mut msg = MimeMessage::default();
        msg.set_multipart(
            "mixed",
            vec![
                BodyPart::multipart(
                    "alternative",
                    vec![BodyPart::text("plain", "hi"), BodyPart::text("html", "<p>hi</p>")],
                ),
                BodyPart::attachment("big.bin", "application/octet-stream", vec![0; 3000]),
                BodyPart::attachment("small.bin", "application/octet-stream", vec![0; 10]),
            ],
        );
        msg
    }

    #[test]
    fn test_composite_after_descendants() {
        let msg = tree();
        let parts = flatten_parts(&msg, &PartFilter::new()).unwrap();
        let types: Vec<_> = parts.iter().map(BodyPart::mime_type).collect();

        assert_eq!(
            types,
            vec![
                "text/plain",
                "text/html",
                "multipart/alternative",
                "application/octet-stream",
                "application/octet-stream",
            ]
        );
        let alternative = &msg.parts().unwrap()[0];
        assert_eq!(parts[2].id(), alternative.id());
    }

    #[test]
    fn test_not_multipart_is_empty() {
        let msg = MimeMessage::from_root(Default::default(), BodyPart::text("plain", "x"));
        assert!(flatten_parts(&msg, &PartFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_size_floor() {
        let parts = flatten_parts(&tree(), &PartFilter::new().with_min_size_kb(2)).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].filename().as_deref(), Some("big.bin"));
    }

    #[test]
    fn test_size_floor_is_strict() {
        let part = BodyPart::leaf(HeaderList::new(), vec![0; 1024]);
        assert!(!PartFilter::new().with_min_size_kb(1).matches(&part).unwrap());
        assert!(PartFilter::new().with_min_size_kb(0).matches(&part).unwrap());
        assert!(PartFilter::new().with_min_size_kb(-5).matches(&part).unwrap());
    }

    #[test]
    fn test_filters_are_anded() {
        let filter = PartFilter::new().with_min_size_kb(2).with_disposition("ATTACHMENT");
        let parts = flatten_parts(&tree(), &filter).unwrap();
        assert_eq!(parts.len(), 1);

        let inline_only = PartFilter::new().with_min_size_kb(2).with_disposition("inline");
        assert!(flatten_parts(&tree(), &inline_only).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_disposition_aborts() {
        let mut headers = HeaderList::new();
        headers.add("Content-Disposition", "; filename=x");
        let mut msg = MimeMessage::default();
        msg.set_multipart("mixed", vec![BodyPart::leaf(headers, vec![1])]);

        let err = flatten_parts(&msg, &PartFilter::new().with_disposition("attachment")).unwrap_err();
        assert_eq!(err.subject, "disposition");
        assert!(flatten_parts(&msg, &PartFilter::new()).is_ok());
    }
}
