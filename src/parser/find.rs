use chumsky::prelude::*;
use log::trace;

use super::grammar::{addr_spec_prefix, is_domain_char, is_local_char};

/// Find every address-shaped substring of free text, left to right.
///
/// Matches are returned exactly as written, without display names and
/// without case normalization. Matches never overlap.
pub fn find_all_addresses(text: &str) -> Vec<String> {
    let grammar = addr_spec_prefix();
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('@') {
        let at = pos + offset;
        let start = candidate_start(text, pos, at);
        if start < at {
            let end = candidate_end(text, at + 1);
            if let Ok(matched) = grammar.parse(&text[start..end]).into_result() {
                trace!("Found address {:?} at byte {}", matched, start);
                found.push(matched.to_string());
                pos = start + matched.len();
                continue;
            }
        }
        pos = at + 1;
    }
    found
}

/// Walk back from the `@` over the local part, jumping over quoted strings,
/// without crossing `floor`.
fn candidate_start(text: &str, floor: usize, at: usize) -> usize {
    let mut start = at;
    while let Some(c) = text[floor..start].chars().next_back() {
        if is_local_char(c) {
            start -= c.len_utf8();
        } else if c == '"' {
            match text[floor..start - 1].rfind('"') {
                Some(open) => start = floor + open,
                None => break,
            }
        } else {
            break;
        }
    }
    start
}

/// End of the run of domain characters after the `@`.
fn candidate_end(text: &str, from: usize) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !is_domain_char(*c))
        .map_or(text.len(), |(i, _)| from + i)
}
