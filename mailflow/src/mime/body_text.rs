//! Appending to or replacing the text of body parts.

use tracing::{debug, warn};

use super::encoding::decode_encoded_words;
use super::html::append_to_body;
use super::message::MimeMessage;
use super::part::{BodyPart, TextMode};

/// A text edit. At least one of `plain` and `html` should be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Append or replace.
    pub mode: TextMode,
    /// Applied to `text/plain` parts.
    pub plain: Option<String>,
    /// Applied to `text/html` parts.
    pub html: Option<String>,
}

impl TextEdit {
    /// An edit with no overrides.
    #[must_use]
    pub fn new(mode: TextMode) -> Self {
        Self {
            mode,
            plain: None,
            html: None,
        }
    }

    /// Sets the plain-text override.
    #[must_use]
    pub fn with_plain(mut self, text: impl Into<String>) -> Self {
        self.plain = Some(text.into());
        self
    }

    /// Sets the HTML override.
    #[must_use]
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

/// What an edit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextEditReport {
    /// Parts whose content changed.
    pub modified: usize,
    /// HTML parts left untouched because HTML replace is unsupported.
    pub html_replace_skipped: usize,
}

/// Applies `edit` to the text parts of `message`.
///
/// For a multipart body the targets are the direct leaf children whose
/// content type mentions `text`; otherwise the body itself. Content types
/// never change and text is re-encoded in the part's charset.
pub fn modify_text_body(message: &mut MimeMessage, edit: &TextEdit) -> TextEditReport {
    let mut report = TextEditReport::default();
    match message.parts_mut() {
        Some(children) => {
            for part in children
                .iter_mut()
                .filter(|p| !p.is_multipart() && p.content_type().to_ascii_lowercase().contains("text"))
            {
                apply(part, edit, &mut report);
            }
        }
        None => apply(message.root_mut(), edit, &mut report),
    }
    debug!(
        modified = report.modified,
        skipped = report.html_replace_skipped,
        "Applied text edit"
    );
    report
}

fn apply(part: &mut BodyPart, edit: &TextEdit, report: &mut TextEditReport) {
    let mime_type = part.mime_type();
    let baseline = part.text_content().unwrap_or_default();

    let updated = match (mime_type.as_str(), &edit.plain, &edit.html) {
        ("text/plain", Some(plain), _) => Some(match edit.mode {
            TextMode::Append => decode_encoded_words(&baseline) + plain,
            TextMode::Replace => decode_encoded_words(plain),
        }),
        ("text/html", _, Some(html)) => match edit.mode {
            TextMode::Append => Some(append_to_body(&decode_encoded_words(&baseline), html)),
            TextMode::Replace => {
                warn!(part = %part.id(), "HTML replace is not supported; part left unchanged");
                report.html_replace_skipped += 1;
                None
            }
        },
        _ => None,
    };

    if let Some(text) = updated {
        part.set_text_content(&text);
        report.modified += 1;
    }
}
