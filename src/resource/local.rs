//! Locating local files referenced from a saved page.
//!
//! Browsers and note-taking tools export pages with slightly different
//! layouts, so a reference is tried against an ordered list of candidate
//! paths until one of them can be read.

use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Where a document lives, as needed to locate its resources.
#[derive(Debug, Clone)]
pub struct Lookup {
    /// Directory containing the HTML document.
    pub dir: PathBuf,
    /// Document file name without its extension.
    pub stem: String,
}

impl Lookup {
    /// Build a lookup context for the document at `document`.
    pub fn for_document(document: &Path) -> Self {
        let dir = document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { dir, stem }
    }
}

/// A candidate-path generator. Returns `None` when it does not apply.
pub type Candidate = fn(&Lookup, &str) -> Option<PathBuf>;

/// Candidate generators, in the order they are tried.
pub const CANDIDATES: &[Candidate] = &[literal, percent_decoded, files_dir, resources_dir];

/// The reference as written, relative to the document directory.
pub fn literal(lookup: &Lookup, reference: &str) -> Option<PathBuf> {
    Some(lookup.dir.join(reference))
}

/// The percent-decoded reference, if decoding changes anything.
pub fn percent_decoded(lookup: &Lookup, reference: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(reference).decode_utf8().ok()?;
    (decoded != reference).then(|| lookup.dir.join(&*decoded))
}

/// `<stem>_files/<name>`, as written by browsers and Evernote.
pub fn files_dir(lookup: &Lookup, reference: &str) -> Option<PathBuf> {
    export_dir(lookup, reference, "_files")
}

/// `<stem>.resources/<name>`, as written by Evernote for macOS.
pub fn resources_dir(lookup: &Lookup, reference: &str) -> Option<PathBuf> {
    export_dir(lookup, reference, ".resources")
}

fn export_dir(lookup: &Lookup, reference: &str, suffix: &str) -> Option<PathBuf> {
    if lookup.stem.is_empty() {
        return None;
    }
    let decoded = percent_decode_str(reference).decode_utf8_lossy();
    let name = Path::new(&*decoded).file_name()?;
    Some(
        lookup
            .dir
            .join(format!("{}{suffix}", lookup.stem))
            .join(name),
    )
}

/// Read the file a reference points to.
///
/// Candidates are tried in order. When all of them fail and the reference
/// ends with a `.`, the whole sequence is retried without it. The error of the
/// last attempt is returned if nothing could be read.
pub fn read(lookup: &Lookup, reference: &str) -> io::Result<(PathBuf, Vec<u8>)> {
    let mut last_error = None;

    for candidate in CANDIDATES {
        let Some(path) = candidate(lookup, reference) else {
            continue;
        };
        match std::fs::read(&path) {
            Ok(data) => return Ok((path, data)),
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "Candidate not readable");
                last_error = Some(e);
            }
        }
    }

    if let Some(stripped) = reference.strip_suffix('.').filter(|s| !s.is_empty()) {
        return read(lookup, stripped);
    }

    Err(last_error.unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no candidate path")))
}
