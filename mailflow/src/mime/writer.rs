//! Serializing the MIME tree to RFC 5322 bytes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::address::Address;
use super::codec::ADDRESS_HEADERS;
use super::encoding::{encode_header_value, encode_word, needs_encoding};
use super::message::MimeMessage;
use super::part::{new_boundary, BodyPart, MimeNode};

const MAX_LINE: usize = 998;
const FOLD_AT: usize = 78;
const BASE64_LINE: usize = 76;

/// Serialization switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Leave `Bcc` off the message headers.
    pub omit_bcc: bool,
}

impl WriteOptions {
    /// Options for handing a message to a submission server.
    #[must_use]
    pub fn for_submission() -> Self {
        Self { omit_bcc: true }
    }
}

/// Serializes a message with CRLF line endings.
///
/// Leaves are written `7bit` when they are short-lined ASCII and `base64`
/// otherwise. Composites missing a boundary get a fresh one.
#[must_use]
pub fn write_message(message: &MimeMessage, options: &WriteOptions) -> Vec<u8> {
    let mut out = Vec::new();
    if !message.headers().contains("MIME-Version") {
        out.extend_from_slice(b"MIME-Version: 1.0\r\n");
    }
    write_part(&mut out, message.root(), true, options);
    out
}

fn write_part(out: &mut Vec<u8>, part: &BodyPart, is_root: bool, options: &WriteOptions) {
    let boundary = match part.node() {
        MimeNode::Composite { .. } => {
            Some(part.content_type_param("boundary").unwrap_or_else(new_boundary))
        }
        MimeNode::Leaf { .. } => None,
    };
    let mut wrote_content_type = false;

    for header in part.headers() {
        let Some(value) = &header.value else { continue };
        if header.is("Content-Transfer-Encoding") || (is_root && options.omit_bcc && header.is("Bcc")) {
            continue;
        }
        if header.is("Content-Type") {
            wrote_content_type = true;
            if let Some(boundary) = &boundary {
                if part.content_type_param("boundary").is_none() {
                    write_header(out, &header.name, &format!("{value}; boundary=\"{boundary}\""));
                    continue;
                }
            }
        }
        write_header(out, &header.name, value);
    }

    match (part.node(), boundary) {
        (MimeNode::Composite { children }, Some(boundary)) => {
            if !wrote_content_type {
                write_header(out, "Content-Type", &format!("multipart/mixed; boundary=\"{boundary}\""));
            }
            out.extend_from_slice(b"\r\n");
            for child in children {
                out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                write_part(out, child, false, options);
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        }
        (MimeNode::Leaf { content }, _) => write_leaf(out, content),
        (MimeNode::Composite { .. }, None) => {}
    }
}

fn write_leaf(out: &mut Vec<u8>, content: &[u8]) {
    if is_seven_bit(content) {
        out.extend_from_slice(b"Content-Transfer-Encoding: 7bit\r\n\r\n");
        out.extend_from_slice(&normalize_line_endings(content));
    } else {
        out.extend_from_slice(b"Content-Transfer-Encoding: base64\r\n\r\n");
        let encoded = BASE64.encode(content);
        let lines: Vec<&[u8]> = encoded.as_bytes().chunks(BASE64_LINE).collect();
        out.extend_from_slice(&lines.join(&b"\r\n"[..]));
    }
}

fn is_seven_bit(content: &[u8]) -> bool {
    content.iter().all(|&b| b.is_ascii() && b != 0)
        && content
            .split(|&b| b == b'\n')
            .all(|line| line.len() <= MAX_LINE)
}

fn normalize_line_endings(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut previous = 0u8;
    for &b in content {
        if b == b'\n' && previous != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        previous = b;
    }
    out
}

fn write_header(out: &mut Vec<u8>, name: &str, value: &str) {
    let encoded = if ADDRESS_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)) {
        encode_address_value(value)
    } else {
        encode_header_value(value)
    };
    out.extend_from_slice(fold(&format!("{name}: {encoded}")).as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// Encodes only display names so the angle-addrs stay parseable.
fn encode_address_value(value: &str) -> String {
    if !needs_encoding(value) {
        return value.to_string();
    }
    match Address::parse_list(value) {
        Ok(list) => list
            .iter()
            .map(|address| match &address.display_name {
                Some(name) if needs_encoding(name) => {
                    format!("{} <{}>", encode_word(name), address.email)
                }
                _ => address.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Err(_) => encode_header_value(value),
    }
}

/// Folds a header line at spaces so no line exceeds [`FOLD_AT`] where a
/// break point exists.
fn fold(line: &str) -> String {
    if line.len() <= FOLD_AT {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + 8);
    let mut current = 0;
    for (i, word) in line.split(' ').enumerate() {
        if i > 0 {
            if current + 1 + word.len() > FOLD_AT && current > 0 {
                out.push_str("\r\n ");
                current = 1;
            } else {
                out.push(' ');
                current += 1;
            }
        }
        out.push_str(word);
        current += word.len();
    }
    out
}
