//! Resource resolution: turning `src`/`href` references into embedded
//! attachments or normalized URLs.

pub mod cid;
pub mod data_uri;
pub mod local;
pub mod media;
pub mod remote;

use std::collections::HashMap;
use std::path::Path;

use crate::error::ResolveError;
use crate::html::unescape_text;
use crate::model::attachment::Attachment;

use self::local::Lookup;

/// Maximum number of characters of a data URI shown in diagnostics.
const LOG_PREVIEW_CHARS: usize = 30;

/// What kind of resource a reference points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// Empty attribute value; nothing to do.
    Empty,
    /// `http://`, `https://` or protocol-relative `//` URL.
    Remote(&'a str),
    /// Inline `data:` URI.
    DataUri(&'a str),
    /// Already points at an embedded part (`cid:`).
    Embedded(&'a str),
    /// Anything else is taken as a path relative to the document.
    Local(&'a str),
}

impl<'a> Reference<'a> {
    /// Classify a raw attribute value.
    pub fn classify(raw: &'a str) -> Self {
        if raw.is_empty() {
            Self::Empty
        } else if remote::is_remote(raw) {
            Self::Remote(raw)
        } else if remote::has_prefix_ignore_case(raw, "data:") {
            Self::DataUri(raw)
        } else if remote::has_prefix_ignore_case(raw, "cid:") {
            Self::Embedded(raw)
        } else {
            Self::Local(raw)
        }
    }
}

/// The outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Write this URL back into the attribute.
    Url(String),
    /// The resource is embedded; write `cid:<id>` back.
    ContentId(String),
    /// Leave the attribute as it is.
    Unchanged,
}

impl Resolution {
    /// The attribute value to write back, if any.
    pub fn attribute_value(&self) -> Option<String> {
        match self {
            Self::Url(url) => Some(url.clone()),
            Self::ContentId(id) => Some(format!("cid:{id}")),
            Self::Unchanged => None,
        }
    }
}

/// Content-ids assigned while processing one document.
///
/// Each distinct reference is attached at most once; later occurrences reuse
/// the id recorded for the first one.
#[derive(Debug, Default)]
pub struct ContentIdTable {
    ids: HashMap<String, String>,
    attachments: Vec<Attachment>,
}

impl ContentIdTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content-id previously assigned to `reference`.
    pub fn get(&self, reference: &str) -> Option<&str> {
        self.ids.get(reference).map(String::as_str)
    }

    /// Record `attachment` as the resource behind `reference`.
    ///
    /// Returns the content-id now associated with the reference. If the
    /// reference was already registered the existing id is kept and the new
    /// attachment is dropped.
    pub fn insert(&mut self, reference: &str, attachment: Attachment) -> String {
        if let Some(existing) = self.ids.get(reference) {
            return existing.clone();
        }
        let content_id = attachment.content_id.clone();
        if !self.attachments.iter().any(|a| a.content_id == content_id) {
            self.attachments.push(attachment);
        }
        self.ids.insert(reference.to_string(), content_id.clone());
        content_id
    }

    /// Attachments registered so far.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Consume the table and return its attachments in registration order.
    pub fn into_attachments(self) -> Vec<Attachment> {
        self.attachments
    }

    /// Number of distinct references registered.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether an attachment with `content_id` has been registered.
    pub fn contains_content_id(&self, content_id: &str) -> bool {
        self.attachments.iter().any(|a| a.content_id == content_id)
    }

    /// `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Resolves references found in one document.
#[derive(Debug, Clone)]
pub struct Resolver {
    lookup: Lookup,
}

impl Resolver {
    /// Resolver for references found in the document at `document`.
    pub fn for_document(document: &Path) -> Self {
        Self {
            lookup: Lookup::for_document(document),
        }
    }

    /// Resolve `raw`, registering any embedded resource in `table`.
    ///
    /// `raw` is the attribute text as written in the markup. Local paths are
    /// entity-decoded before lookup; URLs and data URIs are used verbatim.
    pub fn resolve(
        &self,
        raw: &str,
        table: &mut ContentIdTable,
    ) -> Result<Resolution, ResolveError> {
        match Reference::classify(raw) {
            Reference::Empty => Ok(Resolution::Unchanged),
            Reference::Embedded(reference) => check_embedded(reference, table),
            Reference::Remote(url) => remote::normalize(url).map(Resolution::Url),
            Reference::DataUri(uri) => resolve_data_uri(uri, table).map(Resolution::ContentId),
            Reference::Local(path) => self
                .resolve_local(&unescape_text(path), table)
                .map(Resolution::ContentId),
        }
    }

    fn resolve_local(
        &self,
        reference: &str,
        table: &mut ContentIdTable,
    ) -> Result<String, ResolveError> {
        if let Some(existing) = table.get(reference) {
            return Ok(existing.to_string());
        }

        let (path, data) =
            local::read(&self.lookup, reference).map_err(|source| ResolveError::LocalFile {
                reference: reference.to_string(),
                source,
            })?;

        let media = media::detect(&path, &data);
        let content_id = cid::content_id(reference, &media.extension);
        tracing::debug!(
            reference,
            path = %path.display(),
            content_type = %media.mime,
            "Embedding local file"
        );

        Ok(table.insert(
            reference,
            Attachment::related(content_id, media.mime, data),
        ))
    }
}

/// A `cid:` already in the markup is kept only if it names a registered part.
fn check_embedded(reference: &str, table: &ContentIdTable) -> Result<Resolution, ResolveError> {
    let content_id = reference["cid:".len()..].trim_matches(['<', '>']);
    if table.contains_content_id(content_id) {
        Ok(Resolution::Unchanged)
    } else {
        Err(ResolveError::DanglingContentId {
            reference: reference.to_string(),
        })
    }
}

fn resolve_data_uri(uri: &str, table: &mut ContentIdTable) -> Result<String, ResolveError> {
    if let Some(existing) = table.get(uri) {
        return Ok(existing.to_string());
    }

    let decoded = data_uri::decode(uri).map_err(|reason| ResolveError::DataUri {
        reference: preview(uri),
        reason,
    })?;

    let content_type = media::essence(&decoded.content_type);
    let content_id = cid::content_id(uri, &media::extension_for(&content_type));

    Ok(table.insert(
        uri,
        Attachment::related(content_id, content_type, decoded.data),
    ))
}

/// Shorten long references (data URIs) for log output.
pub fn preview(reference: &str) -> String {
    match reference.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &reference[..end]),
        None => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(Reference::classify(""), Reference::Empty);
        assert_eq!(
            Reference::classify("https://a.com/x.png"),
            Reference::Remote("https://a.com/x.png")
        );
        assert_eq!(
            Reference::classify("data:image/png;base64,AA"),
            Reference::DataUri("data:image/png;base64,AA")
        );
        assert_eq!(
            Reference::classify("Data:,x"),
            Reference::DataUri("Data:,x")
        );
        assert_eq!(
            Reference::classify("cid:abc.png"),
            Reference::Embedded("cid:abc.png")
        );
        assert_eq!(Reference::classify("cat.png"), Reference::Local("cat.png"));
        assert_eq!(Reference::classify("a"), Reference::Local("a"));
    }

    #[test]
    fn test_attribute_value() {
        assert_eq!(
            Resolution::ContentId("x.png".into()).attribute_value(),
            Some("cid:x.png".to_string())
        );
        assert_eq!(
            Resolution::Url("http://a".into()).attribute_value(),
            Some("http://a".to_string())
        );
        assert_eq!(Resolution::Unchanged.attribute_value(), None);
    }

    #[test]
    fn test_table_dedupes_references() {
        let mut table = ContentIdTable::new();
        let first = table.insert("a.png", Attachment::related("id1.png", "image/png", vec![1]));
        let second = table.insert("a.png", Attachment::related("id2.png", "image/png", vec![2]));
        assert_eq!(first, "id1.png");
        assert_eq!(second, "id1.png");
        assert_eq!(table.len(), 1);
        assert_eq!(table.attachments().len(), 1);
        assert_eq!(table.get("a.png"), Some("id1.png"));
    }

    #[test]
    fn test_preview() {
        let long = format!("data:image/png;base64,{}", "A".repeat(100));
        let short = preview(&long);
        assert_eq!(short.chars().count(), LOG_PREVIEW_CHARS + 3);
        assert!(short.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_resolve_data_uri_round_trip() {
        use base64::Engine;
        let bytes: Vec<u8> = (0u8..=255).collect();
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );

        let resolver = Resolver::for_document(Path::new("page.html"));
        let mut table = ContentIdTable::new();
        let resolution = resolver.resolve(&uri, &mut table).unwrap();

        let Resolution::ContentId(id) = resolution else {
            panic!("expected content id, got {resolution:?}");
        };
        assert_eq!(id, cid::content_id(&uri, ".png"));
        assert_eq!(table.attachments()[0].data, bytes);
        assert!(table.attachments()[0].related);
    }

    #[test]
    fn test_resolve_bad_data_uri() {
        let resolver = Resolver::for_document(Path::new("page.html"));
        let mut table = ContentIdTable::new();
        let err = resolver
            .resolve("data:image/png;base64,!!!!notbase64!!!!", &mut table)
            .unwrap_err();
        match err {
            ResolveError::DataUri { reference, .. } => assert!(reference.ends_with("...")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(table.is_empty());
    }

    #[test]
    fn test_resolve_empty() {
        let resolver = Resolver::for_document(Path::new("page.html"));
        let mut table = ContentIdTable::new();
        assert_eq!(resolver.resolve("", &mut table).unwrap(), Resolution::Unchanged);
        assert!(table.is_empty());
    }

    #[test]
    fn test_resolve_embedded() {
        let resolver = Resolver::for_document(Path::new("page.html"));
        let mut table = ContentIdTable::new();
        table.insert("a.png", Attachment::related("foo.png", "image/png", vec![1]));

        assert_eq!(
            resolver.resolve("cid:foo.png", &mut table).unwrap(),
            Resolution::Unchanged
        );
        assert_eq!(
            resolver.resolve("CID:<foo.png>", &mut table).unwrap(),
            Resolution::Unchanged
        );
        let err = resolver.resolve("cid:bar.png", &mut table).unwrap_err();
        assert!(matches!(err, ResolveError::DanglingContentId { .. }));
        assert_eq!(table.attachments().len(), 1);
    }

    #[test]
    fn test_resolve_local_decodes_entities() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a&b.png"), b"data").unwrap();
        let resolver = Resolver::for_document(&tmp.path().join("page.html"));
        let mut table = ContentIdTable::new();

        let resolution = resolver.resolve("a&amp;b.png", &mut table).unwrap();
        assert_eq!(
            resolution,
            Resolution::ContentId(cid::content_id("a&b.png", ".png"))
        );
        assert_eq!(table.get("a&b.png"), Some(cid::content_id("a&b.png", ".png").as_str()));
        assert_eq!(table.attachments()[0].data, b"data");
    }

    #[test]
    fn test_resolve_remote_kept_verbatim() {
        let resolver = Resolver::for_document(Path::new("page.html"));
        let mut table = ContentIdTable::new();
        assert_eq!(
            resolver.resolve("https://example.com/x?a=1&amp;b=2", &mut table).unwrap(),
            Resolution::Url("https://example.com/x?a=1&amp;b=2".to_string())
        );
    }

    #[test]
    fn test_resolve_remote() {
        let resolver = Resolver::for_document(Path::new("page.html"));
        let mut table = ContentIdTable::new();
        assert_eq!(
            resolver.resolve("//example.com/x.png", &mut table).unwrap(),
            Resolution::Url("http://example.com/x.png".to_string())
        );
        assert!(table.is_empty());
    }
}
