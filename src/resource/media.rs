//! Media type detection for embedded resources.
//!
//! Local files are identified by their leading bytes. The file extension is
//! only consulted for text formats that carry no signature (SVG, CSS, ...).

use std::path::Path;

/// Generic type used when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extension used for data URIs whose content type maps to nothing.
const PLACEHOLDER_EXTENSION: &str = ".image";

/// Fixed mapping for the image types that show up in data URIs.
///
/// The system table lists several extensions for some of these (`jpe`, `jfif`
/// before `jpg`), so the common one is pinned here.
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/svg+xml", ".svg"),
    ("image/bmp", ".bmp"),
    ("image/x-icon", ".ico"),
    ("image/vnd.microsoft.icon", ".ico"),
    ("image/avif", ".avif"),
    ("image/tiff", ".tiff"),
];

/// A detected MIME type with the extension used in content-ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// MIME essence, e.g. `"image/png"`.
    pub mime: String,
    /// Extension including the leading dot, or empty when unknown.
    pub extension: String,
}

impl MediaType {
    fn octet_stream() -> Self {
        Self {
            mime: OCTET_STREAM.to_string(),
            extension: String::new(),
        }
    }
}

/// Detect the media type of a local file from its content.
pub fn detect(path: &Path, data: &[u8]) -> MediaType {
    let sniffed = infer::get(data);

    // Text sniffers only recognise generic markup, the extension is more precise.
    if let Some(kind) = sniffed.filter(|k| k.matcher_type() != infer::MatcherType::Text) {
        return MediaType {
            mime: kind.mime_type().to_string(),
            extension: format!(".{}", kind.extension()),
        };
    }

    if let Some(by_name) = from_extension(path) {
        return by_name;
    }

    match sniffed {
        Some(kind) => MediaType {
            mime: kind.mime_type().to_string(),
            extension: format!(".{}", kind.extension()),
        },
        None => MediaType::octet_stream(),
    }
}

/// Guess a media type from the file extension alone.
fn from_extension(path: &Path) -> Option<MediaType> {
    let mime = mime_guess::from_path(path).first()?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    Some(MediaType {
        mime: mime.essence_str().to_string(),
        extension,
    })
}

/// Extension (with leading dot) for a declared content type.
///
/// Parameters such as `;charset=utf-8` are ignored. Falls back to `.image`
/// when the type is unknown.
pub fn extension_for(content_type: &str) -> String {
    let essence = essence(content_type);

    if let Some((_, ext)) = IMAGE_EXTENSIONS.iter().find(|(ct, _)| *ct == essence) {
        return (*ext).to_string();
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| PLACEHOLDER_EXTENSION.to_string())
}

/// Lowercased `type/subtype` part of a content type.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
