//! Parsing RFC 5322 bytes into the MIME tree.

use mailparse::{MailAddr, MailHeader, MailHeaderMap, ParsedMail};
use tracing::{debug, warn};

use super::address::{format_list, Address};
use super::header::{Header, HeaderList};
use super::message::MimeMessage;
use super::part::{essence, BodyPart};
use crate::errors::FormatError;
use crate::transport::MailSession;

/// Replacement for content types that do not parse.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Headers holding address lists; re-rendered from their parsed form.
pub(crate) const ADDRESS_HEADERS: [&str; 6] = ["From", "To", "Cc", "Bcc", "Reply-To", "Sender"];

/// Parses a message.
///
/// Header values are RFC 2047 decoded, leaf bodies transfer-decoded and
/// `Content-Transfer-Encoding` headers dropped.
///
/// # Errors
///
/// [`FormatError`] when the bytes cannot be split into headers and body or
/// a body cannot be transfer-decoded.
pub fn parse_message(bytes: &[u8], session: MailSession) -> Result<MimeMessage, FormatError> {
    let parsed = mailparse::parse_mail(bytes)
        .map_err(|e| FormatError::new("message", e.to_string()))?;
    let root = build_part(&parsed, true)?;
    debug!(size = root.size(), multipart = root.is_multipart(), "Parsed message");
    Ok(MimeMessage::from_root(session, root))
}

fn build_part(parsed: &ParsedMail<'_>, is_root: bool) -> Result<BodyPart, FormatError> {
    let mut headers = HeaderList::new();
    for header in &parsed.headers {
        let name = header.get_key();
        if name.eq_ignore_ascii_case("Content-Transfer-Encoding") {
            continue;
        }
        let value = if ADDRESS_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(&name)) {
            address_value(header)
        } else if name.eq_ignore_ascii_case("Content-Type") {
            clean_content_type(&header.get_value())
        } else {
            header.get_value()
        };
        headers.push(Header::new(name, value));
    }

    let is_multipart = headers
        .get("Content-Type")
        .is_some_and(|ct| essence(ct).starts_with("multipart/"));

    if is_multipart {
        let children = parsed
            .subparts
            .iter()
            .map(|child| build_part(child, false))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BodyPart::composite(headers, children))
    } else {
        let mut content = parsed
            .get_body_raw()
            .map_err(|e| FormatError::new("message body", e.to_string()))?;
        if !is_root && !is_base64(parsed) {
            strip_delimiter_newline(&mut content);
        }
        Ok(BodyPart::leaf(headers, content))
    }
}

/// Base64 bodies ignore the line break before a boundary when decoding.
fn is_base64(parsed: &ParsedMail<'_>) -> bool {
    parsed
        .headers
        .get_first_value("Content-Transfer-Encoding")
        .is_some_and(|cte| cte.trim().eq_ignore_ascii_case("base64"))
}

/// Drops the line break that belongs to the following boundary delimiter
/// (RFC 2046 5.1.1).
fn strip_delimiter_newline(content: &mut Vec<u8>) {
    if content.ends_with(b"\r\n") {
        content.truncate(content.len() - 2);
    } else if content.ends_with(b"\n") {
        content.truncate(content.len() - 1);
    }
}

/// Renders an address header from its parsed form so display names that
/// decode to specials stay quoted.
fn address_value(header: &MailHeader<'_>) -> String {
    let Ok(list) = mailparse::addrparse_header(header) else {
        return header.get_value();
    };
    let mut addresses = Vec::new();
    for entry in list.iter() {
        match entry {
            MailAddr::Single(info) => addresses.push(Address {
                display_name: info.display_name.clone(),
                email: info.addr.clone(),
            }),
            MailAddr::Group(group) => addresses.extend(group.addrs.iter().map(|info| Address {
                display_name: info.display_name.clone(),
                email: info.addr.clone(),
            })),
        }
    }
    format_list(&addresses)
}

/// Keeps a content type that parses in full, parameters included,
/// otherwise substitutes [`FALLBACK_CONTENT_TYPE`].
#[must_use]
pub fn clean_content_type(value: &str) -> String {
    if value.trim().parse::<mime::Mime>().is_ok() {
        value.trim().to_string()
    } else {
        warn!(content_type = %value, "Unparseable content type replaced with {}", FALLBACK_CONTENT_TYPE);
        FALLBACK_CONTENT_TYPE.to_string()
    }
}
