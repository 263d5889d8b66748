//! Locate extracted spans in the source text
//!
//! Matching is tried from the strictest to the loosest strategy:
//!
//! 1. verbatim, on word boundaries (`match_exact`)
//! 2. verbatim inside a larger word, widened to that word (`match_greater`)
//! 3. ASCII case-insensitive (`match_fuzzy`)
//! 4. longest leading run of words found case-insensitively (`match_lesser`)
//!
//! Each strategy searches forward from a cursor first, so repeated mentions
//! align to successive occurrences, then falls back to the whole text.

use lexgate_domain::AlignmentStatus;
use std::ops::Range;

/// A located span, as byte offsets into the searched text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Byte range in the searched text
    pub range: Range<usize>,
    /// How the span was located
    pub status: AlignmentStatus,
}

/// Align `needle` within `source`, preferring matches at or after `cursor`
pub fn align(source: &str, needle: &str, cursor: usize) -> Option<Alignment> {
    let needle = needle.trim();
    if needle.is_empty() || source.is_empty() {
        return None;
    }
    let cursor = floor_char_boundary(source, cursor.min(source.len()));

    if let Some(start) = find_from(source, needle, cursor) {
        let range = start..start + needle.len();
        if on_word_boundaries(source, &range) {
            return Some(Alignment {
                range,
                status: AlignmentStatus::MatchExact,
            });
        }
        return Some(Alignment {
            range: widen_to_word(source, range),
            status: AlignmentStatus::MatchGreater,
        });
    }

    // ASCII lowercasing keeps byte offsets valid in the original text
    let lowered_source = source.to_ascii_lowercase();
    let lowered_needle = needle.to_ascii_lowercase();

    if let Some(start) = find_from(&lowered_source, &lowered_needle, cursor) {
        return Some(Alignment {
            range: start..start + lowered_needle.len(),
            status: AlignmentStatus::MatchFuzzy,
        });
    }

    let words: Vec<&str> = lowered_needle.split_whitespace().collect();
    for take in (1..words.len()).rev() {
        let phrase = words[..take].join(" ");
        if let Some(start) = find_from(&lowered_source, &phrase, cursor) {
            return Some(Alignment {
                range: start..start + phrase.len(),
                status: AlignmentStatus::MatchLesser,
            });
        }
    }

    None
}

/// Number of characters before byte offset `byte` in `text`
pub fn char_position(text: &str, byte: usize) -> usize {
    text[..floor_char_boundary(text, byte.min(text.len()))]
        .chars()
        .count()
}

fn find_from(haystack: &str, needle: &str, cursor: usize) -> Option<usize> {
    haystack[cursor..]
        .find(needle)
        .map(|i| cursor + i)
        .or_else(|| haystack.find(needle))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn on_word_boundaries(source: &str, range: &Range<usize>) -> bool {
    let before = source[..range.start].chars().next_back();
    let after = source[range.end..].chars().next();
    let first = source[range.clone()].chars().next();
    let last = source[range.clone()].chars().next_back();

    let open = !(before.is_some_and(is_word_char) && first.is_some_and(is_word_char));
    let close = !(after.is_some_and(is_word_char) && last.is_some_and(is_word_char));
    open && close
}

fn widen_to_word(source: &str, range: Range<usize>) -> Range<usize> {
    let mut start = range.start;
    while let Some(c) = source[..start].chars().next_back() {
        if !is_word_char(c) {
            break;
        }
        start -= c.len_utf8();
    }

    let mut end = range.end;
    while let Some(c) = source[end..].chars().next() {
        if !is_word_char(c) {
            break;
        }
        end += c.len_utf8();
    }

    start..end
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
