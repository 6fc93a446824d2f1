//! `Date:` header derivation.
//!
//! Priority: a publish date declared in the document, then the file's
//! modification time, then the current time.

use std::path::Path;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

/// Where the `Date:` header came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// A publish-date `<meta>` tag.
    Published,
    /// The source file's modification time.
    Modified,
    /// Neither was available.
    Now,
}

/// Compute the `Date:` header value for a document.
///
/// `publish_dates` are candidate values in priority order; the first one that
/// parses wins.
pub fn message_date(source: &Path, publish_dates: &[String]) -> (String, DateSource) {
    if let Some(date) = publish_dates.iter().find_map(|d| parse_date(d)) {
        return (date.to_rfc2822(), DateSource::Published);
    }

    match std::fs::metadata(source).and_then(|m| m.modified()) {
        Ok(modified) => (
            DateTime::<Local>::from(modified).to_rfc2822(),
            DateSource::Modified,
        ),
        Err(e) => {
            warn!(path = %source.display(), error = %e, "No modification time, using current time");
            (Local::now().to_rfc2822(), DateSource::Now)
        }
    }
}

/// Parse a publish date in various common formats.
///
/// Supports RFC 2822, ISO 8601, bare dates, and a few broken real-world
/// variants. The original offset is kept; values without one are taken as UTC.
pub fn parse_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }

    let no_dow = strip_day_of_week(trimmed);

    let formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M%z",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(dt) = DateTime::parse_from_str(&no_dow, fmt) {
            return Some(dt);
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&no_dow, fmt) {
            return Some(Utc.from_utc_datetime(&ndt).fixed_offset());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&no_dow, fmt) {
            let midnight = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&midnight).fixed_offset());
        }
    }

    if let Some(dt) = mail_parser_date(trimmed) {
        return Some(dt);
    }

    warn!(date = trimmed, "Could not parse publish date");
    None
}

/// Attempt to parse a date using `mail-parser`'s built-in parser.
fn mail_parser_date(input: &str) -> Option<DateTime<FixedOffset>> {
    use mail_parser::MessageParser;

    // Wrap input in a minimal RFC 5322 message so mail-parser can parse it
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = MessageParser::default().parse(fake_msg.as_bytes())?;
    let dt = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&dt).ok()
}

/// Strip leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in &days {
        if let Some(rest) = s.strip_prefix(day) {
            if rest.starts_with([',', ' ']) {
                return rest.trim_start_matches([',', ' ']).to_string();
            }
        }
    }
    s.to_string()
}
