//! Text chunking for long documents
//!
//! Chunks never exceed the character budget and never split a UTF-8
//! character. A chunk ends after the last sentence terminator in its window
//! when there is one, otherwise at the last whitespace, otherwise at the hard
//! limit.

/// One chunk of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of the chunk in the document's chunk list
    pub ordinal: usize,
    /// Byte offset of the chunk's first character in the document
    pub byte_offset: usize,
    /// Chunk text, trailing whitespace removed
    pub text: String,
}

/// Split `text` into chunks of at most `max_chars` characters
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<TextChunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = skip_whitespace(text, 0);

    while start < text.len() {
        let window_end = text[start..]
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| start + i)
            .unwrap_or(text.len());

        let cut = if window_end == text.len() {
            window_end
        } else {
            find_break(&text[start..window_end])
                .map(|b| start + b)
                .unwrap_or(window_end)
        };

        let piece = text[start..cut].trim_end();
        if !piece.is_empty() {
            chunks.push(TextChunk {
                ordinal: chunks.len(),
                byte_offset: start,
                text: piece.to_string(),
            });
        }

        start = skip_whitespace(text, cut);
    }

    chunks
}

/// Byte index just past the last sentence end, else at the last whitespace
fn find_break(window: &str) -> Option<usize> {
    let sentence_end = window
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?' | '\n'))
        .last()
        .map(|(i, c)| i + c.len_utf8());

    sentence_end
        .or_else(|| {
            window
                .char_indices()
                .filter(|(_, c)| c.is_whitespace())
                .last()
                .map(|(i, _)| i)
        })
        .filter(|&b| b > 0)
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}
