//! Plain-text rendering of message bodies.
//!
//! Verification mails arrive as HTML; the extractors and the display
//! consumer both want a flat text rendering. This is a tag stripper,
//! not an HTML parser -- the envelope phrases the pattern extractor
//! matches survive any markup the sender wraps them in.

/// Remove `<...>` tags, keeping character data.
///
/// Unterminated tags swallow the rest of the input, matching how a
/// streaming parser would treat a truncated message.
pub fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Collapse all whitespace runs to single spaces and trim the ends.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markup and collapse whitespace in one pass over a raw message.
pub fn flatten(input: &str) -> String {
    collapse_whitespace(&strip_markup(input))
}

/// Bound a snippet to `max_chars` characters.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        input.chars().take(max_chars).collect()
    }
}
