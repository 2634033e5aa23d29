//! Selecting headers by name pattern.

use regex::{Regex, RegexBuilder};

use super::header::{Header, HeaderList};
use crate::errors::FormatError;

/// Compiles a pattern that must match a whole header name, ignoring case.
///
/// # Errors
///
/// [`FormatError`] if the pattern is not a valid regular expression.
pub fn header_pattern(pattern: &str) -> Result<Regex, FormatError> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .case_insensitive(true)
        .build()
        .map_err(|e| FormatError::new("header pattern", format!("'{pattern}': {e}")))
}

/// Collects headers whose name matches any pattern.
///
/// Headers are scanned in order; a header matching several patterns is
/// collected once per match. Headers without a value are skipped.
///
/// # Errors
///
/// [`FormatError`] if any pattern is invalid. No headers are collected then.
pub fn match_headers(headers: &HeaderList, patterns: &[String]) -> Result<Vec<Header>, FormatError> {
    let compiled = patterns
        .iter()
        .map(|p| header_pattern(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::new();
    for header in headers.iter().filter(|h| h.value.is_some()) {
        for regex in &compiled {
            if regex.is_match(&header.name) {
                out.push(header.clone());
            }
        }
    }
    Ok(out)
}
