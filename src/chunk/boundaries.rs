//! Break point detection for chunking

/// Priority levels for break points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BreakPriority {
    /// Any word boundary (lowest)
    Word = 1,
    /// Line break
    Line = 2,
    /// Sentence boundary
    Sentence = 3,
    /// Paragraph boundary (highest)
    Paragraph = 4,
}

/// Classify the boundary that follows a token.
///
/// `token` is the word itself and `gap` the text between it and the next
/// token.
pub fn classify_break(token: &str, gap: &str) -> BreakPriority {
    if gap.contains("\n\n") {
        BreakPriority::Paragraph
    } else if ends_sentence(token) {
        BreakPriority::Sentence
    } else if gap.contains('\n') {
        BreakPriority::Line
    } else {
        BreakPriority::Word
    }
}

fn ends_sentence(token: &str) -> bool {
    matches!(token.chars().last(), Some('.') | Some('?') | Some('!') | Some('।'))
}
