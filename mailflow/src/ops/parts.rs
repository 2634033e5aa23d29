//! Body part and body text operations.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::context::{keys, ExecutionContext, ValueKind};
use crate::contracts::Contract;
use crate::errors::{ContractViolation, Result};
use crate::events::names;
use crate::mime::{
    flatten_parts, modify_text_body, remove_parts, BodyPart, MimeMessage, PartFilter, PartId,
    PartSource, TextEdit, TextMode,
};
use crate::pipeline::Operation;

static GET_MIME_BODY_PARTS: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .optional(keys::GETMIMEBODYPARTS_FILTER_SIZEGREATERTHEN, ValueKind::Int, "0")
        .optional(keys::GETMIMEBODYPARTS_FILTER_DISPO, ValueKind::Text, "none")
        .output(keys::MIMEBODYPARTS, ValueKind::Parts)
});

/// Flattens the body parts into `mail.mimebodyparts`, filtered by size
/// (kB) and disposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetMimeBodyParts;

impl Operation for GetMimeBodyParts {
    fn name(&self) -> &str {
        "get_mime_body_parts"
    }

    fn contract(&self) -> &Contract {
        &GET_MIME_BODY_PARTS
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let filter = PartFilter {
            min_size_kb: ctx
                .get_opt::<i64>(keys::GETMIMEBODYPARTS_FILTER_SIZEGREATERTHEN)?
                .copied()
                .unwrap_or(0),
            disposition: ctx
                .get_opt::<String>(keys::GETMIMEBODYPARTS_FILTER_DISPO)?
                .cloned(),
        };
        let parts = flatten_parts(ctx.get::<MimeMessage>(keys::MIMEMESSAGE)?, &filter)?;
        ctx.insert(keys::MIMEBODYPARTS, parts);
        Ok(())
    }
}

static REMOVE_MIME_BODY_PARTS: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::MIMEBODYPARTS, ValueKind::Parts)
});

/// Removes the parts listed in `mail.mimebodyparts` from the top level of
/// the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveMimeBodyParts;

impl Operation for RemoveMimeBodyParts {
    fn name(&self) -> &str {
        "remove_mime_body_parts"
    }

    fn contract(&self) -> &Contract {
        &REMOVE_MIME_BODY_PARTS
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let ids: Vec<PartId> = ctx
            .get::<Vec<BodyPart>>(keys::MIMEBODYPARTS)?
            .iter()
            .map(BodyPart::id)
            .collect();
        remove_parts(ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?, &ids);
        Ok(())
    }
}

static ADD_MIME_BODY_PARTS: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::ADDMIMEBODYPARTS, ValueKind::PartSources)
});

/// Replaces the body with a `multipart/mixed` built from
/// `mail.addmimebodyparts`: files become attachments, text becomes
/// `text/plain` parts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddMimeBodyParts;

impl AddMimeBodyParts {
    fn part_from(source: &PartSource) -> Result<BodyPart> {
        match source {
            PartSource::File(path) => {
                let content = std::fs::read(path)?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                debug!(file = %file_name, "Create body part from file");
                Ok(BodyPart::attachment(
                    &file_name,
                    guess_content_type(path).essence_str(),
                    content,
                ))
            }
            PartSource::Text(text) => {
                debug!("Create body part from text");
                Ok(BodyPart::text("plain", text))
            }
        }
    }
}

/// Content type from a file extension.
fn guess_content_type(path: &Path) -> mime::Mime {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "txt" | "text" => mime::TEXT_PLAIN,
        "htm" | "html" => mime::TEXT_HTML,
        "csv" => mime::TEXT_CSV,
        "xml" => mime::TEXT_XML,
        "json" => mime::APPLICATION_JSON,
        "pdf" => mime::APPLICATION_PDF,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

impl Operation for AddMimeBodyParts {
    fn name(&self) -> &str {
        "add_mime_body_parts"
    }

    fn contract(&self) -> &Contract {
        &ADD_MIME_BODY_PARTS
    }

    fn check(&self, ctx: &ExecutionContext) -> std::result::Result<(), ContractViolation> {
        if ctx.get::<Vec<PartSource>>(keys::ADDMIMEBODYPARTS)?.is_empty() {
            return Err(ContractViolation::precondition(
                keys::ADDMIMEBODYPARTS,
                "is an empty list",
            ));
        }
        Ok(())
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let parts = ctx
            .get::<Vec<PartSource>>(keys::ADDMIMEBODYPARTS)?
            .iter()
            .map(Self::part_from)
            .collect::<Result<Vec<_>>>()?;
        ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?
            .set_multipart("mixed", parts);
        Ok(())
    }
}

static SAVE_ATTACHMENT_FILES: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEBODYPARTS, ValueKind::Parts)
        .require(keys::SAVEATTACHMENTFILE_BASEDIR, ValueKind::Text)
        .output(keys::SAVEATTACHMENTFILE_SAVEDFILES, ValueKind::TextList)
});

/// Writes every part in `mail.mimebodyparts` with an `attachment`
/// disposition and a filename into the base directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveAttachmentFiles;

impl Operation for SaveAttachmentFiles {
    fn name(&self) -> &str {
        "save_attachment_files"
    }

    fn contract(&self) -> &Contract {
        &SAVE_ATTACHMENT_FILES
    }

    fn check(&self, ctx: &ExecutionContext) -> std::result::Result<(), ContractViolation> {
        let base_dir = ctx.get::<String>(keys::SAVEATTACHMENTFILE_BASEDIR)?;
        if !Path::new(base_dir).is_dir() {
            return Err(ContractViolation::precondition(
                keys::SAVEATTACHMENTFILE_BASEDIR,
                format!("{base_dir} not exist"),
            ));
        }
        Ok(())
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let base_dir = PathBuf::from(ctx.get::<String>(keys::SAVEATTACHMENTFILE_BASEDIR)?);
        let mut saved = Vec::new();

        for part in ctx.get::<Vec<BodyPart>>(keys::MIMEBODYPARTS)? {
            if part.disposition()?.as_deref() != Some("attachment") {
                continue;
            }
            let Some(file_name) = part.filename() else {
                continue;
            };
            // Only the final path component; names like "../x" stay inside the base dir.
            let Some(safe_name) = Path::new(&file_name).file_name() else {
                warn!(file = %file_name, "Attachment name has no file component; skipped");
                continue;
            };
            let Some(content) = part.content() else {
                warn!(file = %file_name, "Attachment is a multipart container; skipped");
                continue;
            };

            let full = base_dir.join(safe_name);
            debug!(file = %full.display(), "Save attachment file");
            std::fs::write(&full, content)?;
            saved.push(full.display().to_string());
        }

        ctx.insert(keys::SAVEATTACHMENTFILE_SAVEDFILES, saved);
        Ok(())
    }
}

static MOD_TEXT_BODY: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new()
        .require(keys::MIMEMESSAGE, ValueKind::Message)
        .require(keys::MODTEXTBODY_TYPE, ValueKind::TextMode)
        .optional(keys::MODTEXTBODY_PLAIN, ValueKind::Text, "none")
        .optional(keys::MODTEXTBODY_HTML, ValueKind::Text, "none")
});

/// Appends to or replaces the plain and HTML body text.
///
/// HTML replace is not supported: affected parts stay unchanged and a
/// `body_text.html_replace_unsupported` event is emitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModTextBody;

impl Operation for ModTextBody {
    fn name(&self) -> &str {
        "mod_text_body"
    }

    fn contract(&self) -> &Contract {
        &MOD_TEXT_BODY
    }

    fn check(&self, ctx: &ExecutionContext) -> std::result::Result<(), ContractViolation> {
        if !ctx.contains(keys::MODTEXTBODY_PLAIN) && !ctx.contains(keys::MODTEXTBODY_HTML) {
            return Err(ContractViolation::precondition(
                keys::MODTEXTBODY_PLAIN,
                "plain or html text must be set",
            ));
        }
        Ok(())
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let edit = TextEdit {
            mode: *ctx.get::<TextMode>(keys::MODTEXTBODY_TYPE)?,
            plain: ctx.get_opt::<String>(keys::MODTEXTBODY_PLAIN)?.cloned(),
            html: ctx.get_opt::<String>(keys::MODTEXTBODY_HTML)?.cloned(),
        };
        let report = modify_text_body(ctx.get_mut::<MimeMessage>(keys::MIMEMESSAGE)?, &edit);

        if report.html_replace_skipped > 0 {
            ctx.emit(
                names::HTML_REPLACE_UNSUPPORTED,
                Some(serde_json::json!({
                    "operation": self.name(),
                    "parts": report.html_replace_skipped,
                })),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::testing::{
        assert_event_emitted, assert_format_error, assert_precondition, context_with_message,
        fixtures,
    };
    use crate::mime::HeaderList;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn message(ctx: &ExecutionContext) -> &MimeMessage {
        ctx.get::<MimeMessage>(keys::MIMEMESSAGE).unwrap()
    }

    fn parts(ctx: &ExecutionContext) -> &Vec<BodyPart> {
        ctx.get::<Vec<BodyPart>>(keys::MIMEBODYPARTS).unwrap()
    }

    #[test]
    fn test_get_parts_unfiltered() {
        let mut ctx = context_with_message(fixtures::NESTED_MULTIPART);
        GetMimeBodyParts.execute(&mut ctx).unwrap();

        let types: Vec<_> = parts(&ctx).iter().map(BodyPart::mime_type).collect();
        assert_eq!(
            types,
            vec!["text/plain", "text/html", "multipart/alternative", "application/pdf"]
        );
    }

    #[test]
    fn test_get_parts_by_disposition() {
        let mut ctx = context_with_message(fixtures::NESTED_MULTIPART)
            .with(keys::GETMIMEBODYPARTS_FILTER_DISPO, "Attachment");
        GetMimeBodyParts.execute(&mut ctx).unwrap();

        assert_eq!(parts(&ctx).len(), 1);
        assert_eq!(parts(&ctx)[0].filename().as_deref(), Some("report.pdf"));
    }

    #[test]
    fn test_get_parts_size_floor_excludes_small() {
        let mut ctx = context_with_message(fixtures::NESTED_MULTIPART)
            .with(keys::GETMIMEBODYPARTS_FILTER_SIZEGREATERTHEN, 1_i64);
        GetMimeBodyParts.execute(&mut ctx).unwrap();
        assert!(parts(&ctx).is_empty());
    }

    #[test]
    fn test_get_parts_single_part_message() {
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT);
        GetMimeBodyParts.execute(&mut ctx).unwrap();
        assert!(parts(&ctx).is_empty());
    }

    #[test]
    fn test_get_then_remove_attachments() {
        let mut ctx = context_with_message(fixtures::NESTED_MULTIPART)
            .with(keys::GETMIMEBODYPARTS_FILTER_DISPO, "attachment");
        GetMimeBodyParts.and_then(RemoveMimeBodyParts).execute(&mut ctx).unwrap();

        let remaining = message(&ctx).parts().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].mime_type(), "multipart/alternative");

        RemoveMimeBodyParts.execute(&mut ctx).unwrap();
        assert_eq!(message(&ctx).parts().unwrap().len(), 1);
    }

    #[test]
    fn test_add_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"file body").unwrap();

        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT).with(
            keys::ADDMIMEBODYPARTS,
            vec![PartSource::Text("Hello".to_string()), PartSource::File(path)],
        );
        AddMimeBodyParts.execute(&mut ctx).unwrap();

        let msg = message(&ctx);
        assert!(msg.content_type().starts_with("multipart/mixed"));
        let children = msg.parts().unwrap();
        assert_eq!(children[0].text_content().as_deref(), Some("Hello"));
        assert_eq!(children[1].filename().as_deref(), Some("notes.txt"));
        assert_eq!(children[1].mime_type(), "text/plain");
        assert_eq!(children[1].content(), Some(&b"file body"[..]));
        assert_eq!(msg.subject(), Some("Hello"));
    }

    #[test]
    fn test_add_parts_empty_list() {
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT)
            .with(keys::ADDMIMEBODYPARTS, Vec::<PartSource>::new());
        let err = AddMimeBodyParts.execute(&mut ctx).unwrap_err();
        assert_precondition(&err, keys::ADDMIMEBODYPARTS);
        assert!(!message(&ctx).is_multipart());
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.PDF")), mime::APPLICATION_PDF);
        assert_eq!(guess_content_type(Path::new("archive")), mime::APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn test_save_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context_with_message(fixtures::NESTED_MULTIPART)
            .with(keys::SAVEATTACHMENTFILE_BASEDIR, dir.path().display().to_string());

        GetMimeBodyParts.and_then(SaveAttachmentFiles).execute(&mut ctx).unwrap();

        let saved = ctx.get::<Vec<String>>(keys::SAVEATTACHMENTFILE_SAVEDFILES).unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].ends_with("report.pdf"));
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"%PDF-1.4 fake");
    }

    #[test]
    fn test_save_attachment_name_stays_in_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let part = BodyPart::attachment("../escape.bin", "application/octet-stream", vec![1]);
        let mut ctx = ExecutionContext::new()
            .with(keys::MIMEBODYPARTS, vec![part])
            .with(keys::SAVEATTACHMENTFILE_BASEDIR, dir.path().display().to_string());

        SaveAttachmentFiles.execute(&mut ctx).unwrap();
        assert!(dir.path().join("escape.bin").exists());
    }

    #[test]
    fn test_save_attachments_missing_dir() {
        let mut ctx = ExecutionContext::new()
            .with(keys::MIMEBODYPARTS, Vec::<BodyPart>::new())
            .with(keys::SAVEATTACHMENTFILE_BASEDIR, "/nonexistent/attachments");
        let err = SaveAttachmentFiles.execute(&mut ctx).unwrap_err();
        assert_precondition(&err, keys::SAVEATTACHMENTFILE_BASEDIR);
    }

    #[test]
    fn test_save_attachments_unreadable_disposition() {
        let dir = tempfile::tempdir().unwrap();
        let mut headers = HeaderList::new();
        headers.add("Content-Disposition", "; filename=x");
        let mut ctx = ExecutionContext::new()
            .with(keys::MIMEBODYPARTS, vec![BodyPart::leaf(headers, vec![1])])
            .with(keys::SAVEATTACHMENTFILE_BASEDIR, dir.path().display().to_string());

        let err = SaveAttachmentFiles.execute(&mut ctx).unwrap_err();
        assert_format_error(&err, "disposition");
    }

    #[test]
    fn test_mod_text_body_append() {
        let mut ctx = context_with_message(fixtures::NESTED_MULTIPART)
            .with(keys::MODTEXTBODY_TYPE, TextMode::Append)
            .with(keys::MODTEXTBODY_PLAIN, " World");
        ModTextBody.execute(&mut ctx).unwrap();

        // Only direct children are edited; the text lives one level down.
        let alternative = &message(&ctx).parts().unwrap()[0];
        let plain = alternative.children().unwrap()[0].text_content();
        assert_eq!(plain.as_deref(), Some("Hello"));

        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT)
            .with(keys::MODTEXTBODY_TYPE, TextMode::Append)
            .with(keys::MODTEXTBODY_PLAIN, " World");
        ModTextBody.execute(&mut ctx).unwrap();
        assert_eq!(message(&ctx).root().text_content().as_deref(), Some("Hello World"));
    }

    #[test]
    fn test_mod_text_body_append_to_multipart_leaf() {
        let raw = "Subject: x\r\nContent-Type: multipart/mixed; boundary=\"b\"\r\n\r\n\
                   --b\r\nContent-Type: text/plain\r\n\r\nHello\r\n--b--\r\n";
        let mut ctx = context_with_message(raw)
            .with(keys::MODTEXTBODY_TYPE, TextMode::Append)
            .with(keys::MODTEXTBODY_PLAIN, " World");
        ModTextBody.execute(&mut ctx).unwrap();

        let part = &message(&ctx).parts().unwrap()[0];
        assert_eq!(part.text_content().as_deref(), Some("Hello World"));
    }

    #[test]
    fn test_mod_text_body_needs_text() {
        let mut ctx = context_with_message(fixtures::SIMPLE_TEXT).with(keys::MODTEXTBODY_TYPE, TextMode::Append);
        let err = ModTextBody.execute(&mut ctx).unwrap_err();
        assert_precondition(&err, keys::MODTEXTBODY_PLAIN);
    }

    #[test]
    fn test_mod_text_body_html_replace_reported() {
        let sink = Arc::new(CollectingEventSink::new());
        let mut msg = MimeMessage::default();
        msg.set_multipart("alternative", vec![BodyPart::text("html", "<p>a</p>")]);
        let mut ctx = ExecutionContext::new()
            .with_event_sink(sink.clone())
            .with(keys::MIMEMESSAGE, msg.clone())
            .with(keys::MODTEXTBODY_TYPE, TextMode::Replace)
            .with(keys::MODTEXTBODY_HTML, "<p>b</p>");

        ModTextBody.execute(&mut ctx).unwrap();
        assert_eq!(message(&ctx), &msg);
        assert_event_emitted(&sink, &ctx, names::HTML_REPLACE_UNSUPPORTED);
    }
}
