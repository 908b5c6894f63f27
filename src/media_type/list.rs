//! Header-list handling: splitting `Accept`-style values into media types.

use smallvec::SmallVec;
use tracing::debug;

use super::core::{MalformedReason, MediaType};

/// Maximum number of request media types per header before heap allocation.
/// Browsers typically send 3-6 `Accept` entries.
pub const MAX_INLINE_REQUEST_TYPES: usize = 8;

/// Media types parsed from one request header, in header order.
pub type RequestMediaTypes = SmallVec<[MediaType; MAX_INLINE_REQUEST_TYPES]>;

/// Split on `separator` everywhere outside a quoted-string.
pub(crate) fn split_unquoted(
    input: &str,
    separator: char,
) -> Result<SmallVec<[&str; 4]>, MalformedReason> {
    let mut parts = SmallVec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (idx, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == separator && !in_quotes => {
                parts.push(&input[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }

    if in_quotes {
        return Err(MalformedReason::UnterminatedQuote);
    }
    parts.push(&input[start..]);
    Ok(parts)
}

/// Split a header value into list entries, tolerating an unterminated quote.
///
/// Entries before the one that opens the stray quote are split quote-aware; from
/// there on the value is split on every comma, so later siblings survive.
pub(crate) fn split_list_entries(raw: &str) -> SmallVec<[&str; 4]> {
    if let Ok(parts) = split_unquoted(raw, ',') {
        return parts;
    }
    let mut parts = SmallVec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (idx, c) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&raw[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.extend(raw[start..].split(','));
    parts
}

/// Parse a comma-separated header value and append every usable entry to `out`.
///
/// Client input is never an error: malformed entries and entries refused with
/// `q=0` are skipped.
pub fn parse_media_type_list(raw: &str, out: &mut RequestMediaTypes) {
    for entry in split_list_entries(raw) {
        if entry.trim().is_empty() {
            continue;
        }
        match MediaType::parse(entry) {
            Ok(media_type) if media_type.is_refused() => {
                debug!(entry = %entry.trim(), "Skipping media type refused with q=0");
            }
            Ok(media_type) => out.push(media_type),
            Err(err) => {
                debug!(entry = %entry.trim(), reason = %err.reason, "Skipping malformed request media type");
            }
        }
    }
}

/// Convenience wrapper around [`parse_media_type_list`] for a single raw value.
#[must_use]
pub fn parse_media_types(raw: &str) -> RequestMediaTypes {
    let mut out = RequestMediaTypes::new();
    parse_media_type_list(raw, &mut out);
    out
}
