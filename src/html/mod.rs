//! HTML handling: source decoding, sanitization, and resource rewriting.
//!
//! Documents are processed with `lol_html`, which rewrites markup as a
//! stream of tokens. Each stage is one rewriting pass over the whole
//! document.

pub mod rewrite;
pub mod sanitize;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

/// How far into the document a `charset` declaration is looked for.
const CHARSET_SNIFF_BYTES: usize = 1024;

/// Decode raw document bytes to text.
///
/// A byte-order mark wins, then a `charset=` declaration near the start of
/// the document, then UTF-8. Malformed sequences are replaced rather than
/// rejected.
pub fn decode_source(bytes: &[u8]) -> String {
    let encoding = sniff_charset(bytes).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(
            encoding = used.name(),
            "Replaced malformed byte sequences in document"
        );
    }
    text.into_owned()
}

/// Find the encoding declared by a `<meta charset>` or `http-equiv` tag.
fn sniff_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(CHARSET_SNIFF_BYTES)];
    let text = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = text.find("charset=")? + "charset=".len();
    let label: String = text[start..]
        .trim_start_matches(['"', '\'', ' '])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();

    // A document can't really be UTF-16 if its declaration was readable as ASCII.
    match Encoding::for_label(label.as_bytes())? {
        e if e == UTF_16LE || e == UTF_16BE => Some(UTF_8),
        e => Some(e),
    }
}

/// Decode the character references that commonly appear in titles.
///
/// Unknown named references are kept verbatim.
pub fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').filter(|&end| end <= 10) {
            Some(end) => match decode_reference(&tail[1..end]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
