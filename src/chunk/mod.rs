//! Text chunking
//!
//! Documents are split into windows of `chunk_size` word tokens with
//! `chunk_overlap` tokens repeated between neighbours. A window closes at the
//! strongest boundary (paragraph, sentence, line) found in its last fifth.

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;
use blake3::Hasher;
use unicode_segmentation::UnicodeSegmentation;

/// A text chunk with metadata
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// The chunk text, sliced verbatim from the document
    pub text: String,

    /// Chunk index within the document (0-based)
    pub index: usize,

    /// Blake3 hash of the document hash and chunk text
    pub hash: String,
}

impl TextChunk {
    pub fn compute_hash(text: &str, doc_hash: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(doc_hash.as_bytes());
        hasher.update(text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Byte span of one word token
#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_word_bound_indices()
        .filter(|(_, word)| !word.trim().is_empty())
        .map(|(start, word)| Token {
            start,
            end: start + word.len(),
        })
        .collect()
}

/// Count word tokens the same way the chunker does
pub fn count_tokens(text: &str) -> usize {
    text.split_word_bounds()
        .filter(|word| !word.trim().is_empty())
        .count()
}

/// Split a document's text into overlapping chunks
pub fn chunk_text(text: &str, doc_hash: &str, config: &ChunkConfig) -> Vec<TextChunk> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Vec::new();
    }

    let size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(size - 1);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = if start + size >= tokens.len() {
            tokens.len()
        } else {
            find_best_break(text, &tokens, start, start + size)
        };

        let slice = &text[tokens[start].start..tokens[end - 1].end];
        chunks.push(TextChunk {
            text: slice.to_string(),
            index: chunks.len(),
            hash: TextChunk::compute_hash(slice, doc_hash),
        });

        if end >= tokens.len() {
            break;
        }

        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Pick the exclusive end token for a window `[start, target)`.
fn find_best_break(text: &str, tokens: &[Token], start: usize, target: usize) -> usize {
    let window_start = start + ((target - start) * 4 / 5).max(1);

    let mut best: Option<(BreakPriority, usize)> = None;
    for end in window_start..=target {
        let last = tokens[end - 1];
        let gap = &text[last.end..tokens[end].start];
        let priority = classify_break(&text[last.start..last.end], gap);
        if priority == BreakPriority::Word {
            continue;
        }
        if best.map_or(true, |(p, _)| priority >= p) {
            best = Some((priority, end));
        }
    }

    best.map(|(_, end)| end).unwrap_or(target)
}

/// Compute a stable hash for document content
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hasher.finalize().to_hex().to_string()
}
