//! Writing assembled messages as `.eml` files.
//!
//! An `.eml` file is a bare RFC 5322 message. The HTML body and its embedded
//! resources form a `multipart/related` tree so mail clients render the
//! resources inline.

use std::path::{Path, PathBuf};

use mail_builder::headers::raw::Raw;
use mail_builder::MessageBuilder;

use crate::error::{ConvertError, Result};
use crate::model::message::Message;

/// Extension of generated message files.
pub const EML_EXTENSION: &str = "eml";

/// Output path for an HTML document: same directory and stem, `.eml` extension.
pub fn eml_path(html: &Path) -> PathBuf {
    html.with_extension(EML_EXTENSION)
}

/// Whether a previous run already produced `eml`.
///
/// Only a non-empty file counts, so an interrupted write is redone.
pub fn already_converted(eml: &Path) -> bool {
    std::fs::metadata(eml).is_ok_and(|m| m.is_file() && m.len() > 0)
}

/// Encode `message` as RFC 5322 bytes.
pub fn assemble(message: &Message) -> std::io::Result<Vec<u8>> {
    let mut builder = MessageBuilder::new();

    if let Some(from) = message.from.to_header() {
        builder = builder.from(from);
    }
    if let Some(to) = message.to.to_header() {
        builder = builder.to(to);
    }

    builder = builder
        .subject(message.subject.as_str())
        .header("Date", Raw::new(message.date.as_str()))
        .html_body(message.html.as_str());

    for attachment in &message.attachments {
        let content_type = attachment.content_type.as_str();
        let content_id = attachment.content_id.as_str();
        let data = attachment.data.as_slice();
        builder = if attachment.related {
            builder.inline(content_type, content_id, data)
        } else {
            builder.attachment(content_type, content_id, data)
        };
    }

    builder.write_to_vec()
}

/// Assemble `message` and write it to `path`.
///
/// Returns the number of bytes written.
pub fn write_eml(message: &Message, source: &Path, path: &Path) -> Result<u64> {
    let bytes = assemble(message).map_err(|source_err| ConvertError::Assemble {
        path: source.to_path_buf(),
        source: source_err,
    })?;

    std::fs::write(path, &bytes).map_err(|e| ConvertError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(bytes.len() as u64)
}
