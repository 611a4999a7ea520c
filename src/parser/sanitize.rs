//! Input normalization applied before any grammar matching.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Unicode replacement character, left behind by failed charset detection.
const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Normalize raw header or free text for parsing.
///
/// Every whitespace code point becomes a plain space, every code point
/// without a visible glyph is dropped along with U+FFFD, and the result is
/// trimmed. Sanitizing an already sanitized string returns it unchanged.
pub fn sanitize(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_whitespace() {
            result.push(' ');
        } else if is_graphic(c) {
            result.push(c);
        }
    }
    result.trim_matches(' ').to_string()
}

/// Code points in the L, M, N, P, S and Zs general categories.
fn is_graphic(c: char) -> bool {
    if c == REPLACEMENT_CHAR {
        return false;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::Surrogate
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}
