//! # Segmentation
//!
//! Turns a raw, paragraph-delimited document into bounded blocks:
//!
//! - `paragraphs`: preprocessing and blank-line splitting.
//! - `rules`: the configurable Q&A marker table and detection.
//! - `blocks`: the hybrid block builder with its Q&A size allowance.
//! - `filter`: the optional Q&A filter and leading-fraction sampling.
//!
//! All lengths in this module are counted in `char`s, not bytes.

pub mod blocks;
pub mod filter;
pub mod paragraphs;
pub mod rules;

pub use blocks::{Block, BlockBounds, HybridBlockBuilder};
pub use filter::{filter_qa_blocks, sample_leading};
pub use paragraphs::{preprocess_qa_text, split_paragraphs, PARAGRAPH_SEPARATOR};
pub use rules::{QaRuleTable, QaRules, QaSignal};

/// Length of `text` in characters.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The last `max_chars` characters of `text`.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// The first `max_chars` characters of `text`.
pub fn head_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_and_head_respect_char_boundaries() {
        let text = "网友：什么是投资？";
        assert_eq!(tail_chars(text, 3), "投资？");
        assert_eq!(head_chars(text, 2), "网友");
        assert_eq!(tail_chars(text, 100), text);
        assert_eq!(head_chars(text, 100), text);
        assert_eq!(tail_chars(text, 0), "");
        assert_eq!(head_chars(text, 0), "");
    }

    #[test]
    fn char_len_counts_characters() {
        assert_eq!(char_len("段永平"), 3);
        assert_eq!(char_len(""), 0);
    }
}
