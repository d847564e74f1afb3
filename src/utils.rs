//! Utility functions for response metadata and display

use chrono::{DateTime, NaiveDateTime, Utc};

/// Default number of characters kept by [`ellipsize`] for body previews
pub const PREVIEW_CHARS: usize = 800;

/// RFC 1123 with a zone name, e.g. `Sat, 29 Aug 2015 21:15:39 GMT`
const RFC1123: &str = "%a, %d %b %Y %H:%M:%S";

/// RFC 1123 with a numeric zone, e.g. `Sat, 29 Aug 2015 23:15:39 +0200`
const RFC1123Z: &str = "%a, %d %b %Y %H:%M:%S %z";


/// Parse a `Last-Modified` header value
///
/// Tries RFC 1123 first, then RFC 1123 with a numeric zone. Returns `None`
/// (the zero time) when neither layout matches.
///
/// A zone abbreviation (`GMT`, `UTC`, `PST`, ...) is not resolved; the
/// timestamp is read at UTC offset.
///
/// # Examples
///
/// ```
/// use resilient_fetch::utils::parse_last_modified;
///
/// let t = parse_last_modified("Sat, 29 Aug 2015 21:15:39 GMT").unwrap();
/// assert_eq!(t.to_rfc3339(), "2015-08-29T21:15:39+00:00");
/// assert!(parse_last_modified("yesterday").is_none());
/// ```
pub fn parse_last_modified(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Some((stamp, zone)) = value.rsplit_once(' ')
        && is_zone_abbreviation(zone)
        && let Ok(naive) = NaiveDateTime::parse_from_str(stamp, RFC1123)
    {
        return Some(naive.and_utc());
    }

    DateTime::parse_from_str(value, RFC1123Z)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Three to five upper-case ASCII letters
fn is_zone_abbreviation(zone: &str) -> bool {
    (3..=5).contains(&zone.len()) && zone.bytes().all(|b| b.is_ascii_uppercase())
}

/// Shorten `text` to at most `max_chars` characters by cutting out its middle
///
/// The head and tail are kept and joined with ` ... `. Text that already fits
/// is returned unchanged. Limits too small for the separator keep only the
/// first `max_chars` characters.
///
/// # Examples
///
/// ```
/// use resilient_fetch::utils::ellipsize;
///
/// assert_eq!(ellipsize("short", 10), "short");
/// assert_eq!(ellipsize("abcdefghijklmnopqrstuvwxyz", 11), "abc ... xyz");
/// ```
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    const SEPARATOR: &str = " ... ";
    if max_chars < SEPARATOR.len() {
        return text.chars().take(max_chars).collect();
    }
    let keep = max_chars.saturating_sub(SEPARATOR.len());
    let head = keep.div_ceil(2);
    let tail = keep / 2;

    let mut out: String = text.chars().take(head).collect();
    out.push_str(SEPARATOR);
    out.extend(text.chars().skip(total - tail));
    out
}
