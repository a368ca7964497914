//! # Hybrid Block Builder
//!
//! Greedily merges consecutive paragraphs into blocks bounded by
//! `[min_size, max_size]` characters. Paragraphs are atomic: a paragraph longer
//! than `max_size` becomes a block on its own rather than being split.
//!
//! Blocks carrying a question/answer exchange may grow beyond `max_size`, up to
//! `max_size * qa_allowance_ratio`. The allowance is checked when a paragraph
//! is about to be appended, against the text the block would have with it;
//! once a block has reached `max_size` it is closed before the next addition.

use super::{char_len, rules::QaRules, PARAGRAPH_SEPARATOR};
use serde::Serialize;
use tracing::{debug, info};

/// A bounded run of consecutive paragraphs, the unit of work for one LLM call.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Block {
    /// Paragraphs joined by a blank line.
    pub content: String,
    /// Number of source paragraphs in `content`.
    pub paragraph_count: usize,
    /// Whether the Q&A rules matched `content`.
    pub has_qa: bool,
    /// Topic keywords, attached by the metadata stage.
    pub anchor: Option<String>,
    /// Trailing excerpt of the previous retained block.
    pub sliding_context: Option<String>,
}

impl Block {
    pub fn new(content: String, paragraph_count: usize, has_qa: bool) -> Self {
        Self {
            content,
            paragraph_count,
            has_qa,
            anchor: None,
            sliding_context: None,
        }
    }

    /// Length of `content` in characters.
    pub fn char_len(&self) -> usize {
        char_len(&self.content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockBounds {
    pub min_size: usize,
    pub max_size: usize,
    pub qa_allowance_ratio: f64,
}

impl BlockBounds {
    /// The relaxed ceiling for Q&A blocks.
    pub fn qa_ceiling(&self) -> usize {
        let relaxed = (self.max_size as f64 * self.qa_allowance_ratio.max(1.0)).floor() as usize;
        relaxed.max(self.max_size)
    }
}

/// The block currently being accumulated.
#[derive(Default)]
struct OpenBlock<'p> {
    paragraphs: Vec<&'p str>,
    len: usize,
}

impl<'p> OpenBlock<'p> {
    fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Length the block would have after appending a paragraph of `para_len` characters.
    fn len_with(&self, para_len: usize) -> usize {
        if self.is_empty() {
            para_len
        } else {
            self.len + PARAGRAPH_SEPARATOR.len() + para_len
        }
    }

    fn text_with(&self, paragraph: &str) -> String {
        let mut text = self.paragraphs.join(PARAGRAPH_SEPARATOR);
        if !text.is_empty() {
            text.push_str(PARAGRAPH_SEPARATOR);
        }
        text.push_str(paragraph);
        text
    }

    fn push(&mut self, paragraph: &'p str, para_len: usize) {
        self.len = self.len_with(para_len);
        self.paragraphs.push(paragraph);
    }
}

pub struct HybridBlockBuilder<'r> {
    bounds: BlockBounds,
    rules: &'r QaRules,
}

impl<'r> HybridBlockBuilder<'r> {
    pub fn new(bounds: BlockBounds, rules: &'r QaRules) -> Self {
        Self { bounds, rules }
    }

    /// Partitions `paragraphs` into blocks, in order.
    ///
    /// Blocks shorter than `min_size` are dropped, not merged into a neighbour.
    pub fn build(&self, paragraphs: &[&str]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut open = OpenBlock::default();

        for &paragraph in paragraphs {
            let para_len = char_len(paragraph);

            if !open.is_empty() {
                let candidate_len = open.len_with(para_len);
                if candidate_len > self.bounds.max_size
                    && !self.within_qa_allowance(&open, paragraph, candidate_len)
                {
                    self.close(std::mem::take(&mut open), &mut blocks);
                }
            }

            open.push(paragraph, para_len);

            if open.len >= self.bounds.max_size {
                self.close(std::mem::take(&mut open), &mut blocks);
            }
        }

        if !open.is_empty() {
            self.close(open, &mut blocks);
        }

        info!("Created {} text blocks", blocks.len());
        blocks
    }

    fn within_qa_allowance(&self, open: &OpenBlock<'_>, paragraph: &str, candidate_len: usize) -> bool {
        if candidate_len > self.bounds.qa_ceiling() {
            return false;
        }
        let allowed = self.rules.has_qa(&open.text_with(paragraph));
        if allowed {
            debug!(
                "QA allowance: block grows to {} chars (nominal max {})",
                candidate_len, self.bounds.max_size
            );
        }
        allowed
    }

    fn close(&self, open: OpenBlock<'_>, blocks: &mut Vec<Block>) {
        if open.len < self.bounds.min_size {
            debug!(
                "Dropping block of {} chars (below min_size {})",
                open.len, self.bounds.min_size
            );
            return;
        }
        let content = open.paragraphs.join(PARAGRAPH_SEPARATOR);
        let has_qa = self.rules.has_qa(&content);
        blocks.push(Block::new(content, open.paragraphs.len(), has_qa));
    }
}
