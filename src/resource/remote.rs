//! Remote URL references.
//!
//! Remote resources are never fetched. They are only validated and, for
//! protocol-relative references, given a concrete scheme so the message does
//! not depend on the page it was saved from.

use url::Url;

use crate::error::ResolveError;

/// Scheme given to protocol-relative references.
pub const DEFAULT_SCHEME: &str = "http";

/// Whether `reference` points to a remote resource.
pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("//")
        || has_prefix_ignore_case(reference, "http://")
        || has_prefix_ignore_case(reference, "https://")
}

/// Validate a remote reference and return the form to write back.
///
/// A reference that already carries a scheme is returned byte-for-byte.
pub fn normalize(reference: &str) -> Result<String, ResolveError> {
    let candidate = if reference.starts_with("//") {
        format!("{DEFAULT_SCHEME}:{reference}")
    } else {
        reference.to_string()
    };

    // Special schemes reject an empty host, so this also catches "http://".
    Url::parse(&candidate).map_err(|source| ResolveError::InvalidUrl {
        reference: reference.to_string(),
        source,
    })?;

    Ok(candidate)
}

/// ASCII case-insensitive `starts_with`.
pub(crate) fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://example.com/a.png"));
        assert!(is_remote("HTTPS://example.com/a.png"));
        assert!(is_remote("//cdn.example.com/a.png"));
        assert!(!is_remote("images/a.png"));
        assert!(!is_remote("data:image/png;base64,AAAA"));
        assert!(!is_remote("httpfoo.png"));
    }

    #[test]
    fn test_normalize_keeps_scheme_byte_for_byte() {
        let reference = "https://Example.com/a%20b.png?x=1&y=2#frag";
        assert_eq!(normalize(reference).unwrap(), reference);
    }

    #[test]
    fn test_normalize_adds_default_scheme() {
        assert_eq!(
            normalize("//example.com/x.png").unwrap(),
            "http://example.com/x.png"
        );
    }

    #[test]
    fn test_normalize_rejects_missing_host() {
        let err = normalize("http://").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUrl { .. }));
    }

    #[test]
    fn test_normalize_rejects_bad_host() {
        assert!(normalize("https://exa mple.com/x.png").is_err());
    }
}
