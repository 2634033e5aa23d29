//! RFC 2047 encoded-words and charset conversion.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

#[allow(clippy::expect_used)]
static ENCODED_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=\?([^?\s]+)\?([bBqQ])\?([^?\s]*)\?=").expect("valid encoded-word regex")
});

/// Longest payload placed in one encoded word, in bytes before base64.
const WORD_CHUNK: usize = 45;

/// Resolves a charset label, falling back to UTF-8.
#[must_use]
pub fn encoding_for(charset: Option<&str>) -> &'static Encoding {
    charset
        .map(|c| c.trim().trim_matches('"'))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8)
}

/// Decodes bytes in the given charset, replacing malformed sequences.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: Option<&str>) -> String {
    let (text, _, had_errors) = encoding_for(charset).decode(bytes);
    if had_errors {
        debug!(charset = ?charset, "Malformed sequences replaced while decoding");
    }
    text.into_owned()
}

/// Encodes text in the given charset. Unmappable characters become numeric
/// character references.
#[must_use]
pub fn encode_charset(text: &str, charset: Option<&str>) -> Vec<u8> {
    let (bytes, _, _) = encoding_for(charset).encode(text);
    bytes.into_owned()
}

/// Decodes every RFC 2047 encoded word in `input`.
///
/// Whitespace between two adjacent encoded words is dropped. Words that fail
/// to decode are kept verbatim.
#[must_use]
pub fn decode_encoded_words(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_end = 0;
    let mut previous_was_word = false;

    for caps in ENCODED_WORD.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        let gap = &input[last_end..whole.start()];
        if !(previous_was_word && gap.chars().all(char::is_whitespace)) {
            out.push_str(gap);
        }

        match decode_word(&caps[1], &caps[2], &caps[3]) {
            Some(decoded) => {
                out.push_str(&decoded);
                previous_was_word = true;
            }
            None => {
                out.push_str(whole.as_str());
                previous_was_word = false;
            }
        }
        last_end = whole.end();
    }
    out.push_str(&input[last_end..]);
    out
}

fn decode_word(charset: &str, scheme: &str, payload: &str) -> Option<String> {
    // RFC 2231 language suffix, e.g. "utf-8*de"
    let charset = charset.split('*').next().unwrap_or(charset);
    let encoding = Encoding::for_label(charset.as_bytes())?;
    let bytes = if scheme.eq_ignore_ascii_case("b") {
        BASE64.decode(payload).ok()?
    } else {
        decode_q(payload)?
    };
    Some(encoding.decode(&bytes).0.into_owned())
}

fn decode_q(payload: &str) -> Option<Vec<u8>> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' => {
                let hex = payload.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    Some(out)
}

/// Returns true if the value cannot go on the wire unencoded.
#[must_use]
pub fn needs_encoding(value: &str) -> bool {
    !value.is_ascii() || value.contains("=?")
}

/// Encodes a header value for the wire.
///
/// ASCII words are kept; each run of words containing non-ASCII text becomes
/// one or more UTF-8 base64 encoded words.
#[must_use]
pub fn encode_header_value(value: &str) -> String {
    if !needs_encoding(value) {
        return value.to_string();
    }

    let words: Vec<&str> = value.split(' ').collect();
    let mut out: Vec<String> = Vec::new();
    let mut run: Vec<&str> = Vec::new();

    for word in words {
        if needs_encoding(word) {
            run.push(word);
        } else {
            if !run.is_empty() {
                out.push(encode_word(&run.join(" ")));
                run.clear();
            }
            out.push(word.to_string());
        }
    }
    if !run.is_empty() {
        out.push(encode_word(&run.join(" ")));
    }
    out.join(" ")
}

/// Encodes text as `=?UTF-8?B?...?=` words, split on character boundaries.
#[must_use]
pub fn encode_word(text: &str) -> String {
    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in text.chars() {
        if chunk.len() + c.len_utf8() > WORD_CHUNK {
            words.push(format!("=?UTF-8?B?{}?=", BASE64.encode(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(format!("=?UTF-8?B?{}?=", BASE64.encode(chunk.as_bytes())));
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_q_word() {
        assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?Gr=FC=DFe_Welt?="), "Grüße Welt");
    }

    #[test]
    fn test_decode_b_word_with_surrounding_text() {
        assert_eq!(
            decode_encoded_words("Re: =?UTF-8?B?SGFsbG8=?= there"),
            "Re: Hallo there"
        );
    }

    #[test]
    fn test_adjacent_words_join() {
        assert_eq!(
            decode_encoded_words("=?UTF-8?Q?a?= =?UTF-8?Q?b?="),
            "ab"
        );
    }

    #[test]
    fn test_undecodable_word_kept() {
        let input = "=?x-unknown?Q?abc?=";
        assert_eq!(decode_encoded_words(input), input);
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(decode_encoded_words("Hello"), "Hello");
    }

    #[test]
    fn test_charset_round_trip() {
        let bytes = encode_charset("Grüße", Some("iso-8859-1"));
        assert_eq!(bytes.len(), 5);
        assert_eq!(decode_charset(&bytes, Some("ISO-8859-1")), "Grüße");
    }

    #[test]
    fn test_unknown_charset_falls_back_to_utf8() {
        assert_eq!(decode_charset("ü".as_bytes(), Some("x-nope")), "ü");
        assert_eq!(encoding_for(None), UTF_8);
    }

    #[test]
    fn test_encode_header_value() {
        assert_eq!(encode_header_value("Hello World"), "Hello World");

        let encoded = encode_header_value("Hallo Jürgen Müller!");
        assert!(encoded.starts_with("Hallo =?UTF-8?B?"));
        assert!(encoded.is_ascii());
        assert_eq!(decode_encoded_words(&encoded), "Hallo Jürgen Müller!");
    }

    #[test]
    fn test_encode_long_word_splits() {
        let text = "ä".repeat(60);
        let encoded = encode_word(&text);
        assert!(encoded.split(' ').all(|w| w.len() <= 75));
        assert_eq!(decode_encoded_words(&encoded), text);
    }
}
