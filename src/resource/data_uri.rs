//! Decoding of inline `data:` URIs (RFC 2397).

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use percent_encoding::percent_decode_str;

/// Default media type of a data URI that declares none.
const DEFAULT_CONTENT_TYPE: &str = "text/plain;charset=US-ASCII";

/// Standard alphabet, tolerant of missing padding as many exporters strip it.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Declared content type, parameters included, without `;base64`.
    pub content_type: String,
    /// Decoded payload.
    pub data: Vec<u8>,
}

/// Decode a `data:[<mediatype>][;base64],<data>` string.
///
/// Returns a short reason on failure.
pub fn decode(uri: &str) -> Result<DataUri, String> {
    let rest = strip_scheme(uri).ok_or_else(|| "missing data: scheme".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "missing ',' separator".to_string())?;

    let mut params: Vec<&str> = header.split(';').map(str::trim).collect();
    let is_base64 = params
        .last()
        .is_some_and(|p| p.eq_ignore_ascii_case("base64"));
    if is_base64 {
        params.pop();
    }

    let content_type = match params.split_first() {
        Some((ty, _)) if !ty.is_empty() => params.join(";"),
        // ";charset=..." with no type keeps the default type
        Some((_, rest)) if !rest.is_empty() => format!("text/plain;{}", rest.join(";")),
        _ => DEFAULT_CONTENT_TYPE.to_string(),
    };

    let unescaped: Vec<u8> = percent_decode_str(payload).collect();
    let data = if is_base64 {
        let compact: Vec<u8> = unescaped
            .into_iter()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        LENIENT_BASE64
            .decode(&compact)
            .map_err(|e| format!("invalid base64: {e}"))?
    } else {
        unescaped
    };

    Ok(DataUri { content_type, data })
}

/// Strip a case-insensitive `data:` prefix.
fn strip_scheme(uri: &str) -> Option<&str> {
    let prefix = uri.get(..5)?;
    prefix
        .eq_ignore_ascii_case("data:")
        .then(|| &uri[5..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_png() {
        let decoded = decode("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(decoded.content_type, "image/png");
        assert_eq!(
            decoded.data,
            vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
        );
    }

    #[test]
    fn test_decode_unpadded_base64() {
        let decoded = decode("data:text/plain;base64,aGk").unwrap();
        assert_eq!(decoded.data, b"hi");
    }

    #[test]
    fn test_decode_base64_with_whitespace() {
        let decoded = decode("data:text/plain;base64,aGVs\n bG8=").unwrap();
        assert_eq!(decoded.data, b"hello");
    }

    #[test]
    fn test_decode_percent_encoded() {
        let decoded = decode("data:image/svg+xml;charset=utf-8,%3Csvg%3E%3C/svg%3E").unwrap();
        assert_eq!(decoded.content_type, "image/svg+xml;charset=utf-8");
        assert_eq!(decoded.data, b"<svg></svg>");
    }

    #[test]
    fn test_decode_default_type() {
        let decoded = decode("data:,Hello").unwrap();
        assert_eq!(decoded.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(decoded.data, b"Hello");
    }

    #[test]
    fn test_decode_charset_without_type() {
        let decoded = decode("data:;charset=utf-8,x").unwrap();
        assert_eq!(decoded.content_type, "text/plain;charset=utf-8");
    }

    #[test]
    fn test_decode_uppercase_scheme() {
        let decoded = decode("DATA:image/gif;BASE64,R0lGODlh").unwrap();
        assert_eq!(decoded.content_type, "image/gif");
        assert_eq!(&decoded.data[..3], b"GIF");
    }

    #[test]
    fn test_decode_missing_separator() {
        assert!(decode("data:image/png;base64").is_err());
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert!(decode("data:image/png;base64,@@@@").is_err());
    }
}
