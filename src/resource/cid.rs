//! Content-id derivation.

use sha2::{Digest, Sha256};

/// Derive the content-id for a raw reference string.
///
/// The id is the lowercase hex SHA-256 digest of `reference` followed by
/// `extension` (which carries its own leading dot, or is empty).
pub fn content_id(reference: &str, extension: &str) -> String {
    let digest = Sha256::digest(reference.as_bytes());
    format!("{digest:x}{extension}")
}
