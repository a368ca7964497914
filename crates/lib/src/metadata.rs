//! # Block Metadata
//!
//! Enriches blocks in document order with two independent hints that make up
//! for the global context lost by chunking:
//!
//! - the trailing excerpt of the previous retained block (sliding context),
//! - a few topic keywords generated by an auxiliary LLM call (anchor).
//!
//! Anchor generation is best effort. A failed call or unusable output leaves
//! the anchor empty and processing continues.

use crate::{
    budget::MAX_CONTEXT_CHARS,
    config::{AnchorMode, ExtractionConfig},
    prompts::anchor::anchor_prompt,
    providers::ai::{AiProvider, GenerationOptions},
    segment::{head_chars, tail_chars, Block},
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};

/// Anchor prompts only see the start of long inputs.
const ANCHOR_INPUT_CHARS: usize = 1500;

static ANCHOR_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:核心)?(?:主题)?(?:关键词|关键字|主题)\s*[:：]\s*").expect("valid anchor label regex")
});

static KEYWORD_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,，、;；/\s]+").expect("valid keyword separator regex"));

const WRAPPING_CHARS: &[char] = &[
    '"', '\'', '“', '”', '‘', '’', '「', '」', '『', '』', '【', '】', '[', ']', '《', '》', '(',
    ')', '（', '）', '`',
];

/// Cleans a raw keyword reply into at most `count` keywords joined by `、`.
///
/// Returns `None` when nothing usable remains.
pub fn parse_anchor(response: &str, count: usize) -> Option<String> {
    let trimmed = response.trim().trim_matches(WRAPPING_CHARS).trim();
    let unlabeled = ANCHOR_LABEL.replace(trimmed, "");
    let keywords: Vec<&str> = KEYWORD_SEPARATORS
        .split(&unlabeled)
        .map(|k| k.trim_matches(WRAPPING_CHARS).trim_end_matches(['。', '.']))
        .filter(|k| !k.is_empty())
        .take(count)
        .collect();
    if keywords.is_empty() {
        None
    } else {
        Some(keywords.join("、"))
    }
}

/// Attaches sliding context and topic anchors to blocks.
#[derive(Debug)]
pub struct MetadataGenerator<'a> {
    provider: &'a dyn AiProvider,
    sliding_context_chars: Option<usize>,
    block_anchors: bool,
    keywords_count: usize,
}

impl<'a> MetadataGenerator<'a> {
    pub fn new(provider: &'a dyn AiProvider, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            sliding_context_chars: config
                .enable_sliding_context
                .then_some(config.sliding_context_chars.min(MAX_CONTEXT_CHARS)),
            block_anchors: config.enable_llm_anchor && config.anchor_mode == AnchorMode::Block,
            keywords_count: config.anchor_keywords_count,
        }
    }

    /// Enriches `blocks` in a single forward pass.
    ///
    /// Block `i` only ever depends on block `i - 1`.
    #[instrument(skip_all, fields(blocks = blocks.len()))]
    pub async fn enrich(&self, mut blocks: Vec<Block>) -> Vec<Block> {
        let mut anchored = 0;
        for i in 0..blocks.len() {
            if let Some(chars) = self.sliding_context_chars {
                if i > 0 {
                    let context = tail_chars(&blocks[i - 1].content, chars).trim();
                    if !context.is_empty() {
                        blocks[i].sliding_context = Some(context.to_string());
                    }
                }
            }
            if self.block_anchors {
                blocks[i].anchor = self.generate_anchor(&blocks[i].content).await;
                if blocks[i].anchor.is_some() {
                    anchored += 1;
                }
            }
        }
        if self.block_anchors {
            info!("Generated anchors for {}/{} blocks", anchored, blocks.len());
        }
        blocks
    }

    /// Asks the model for topic keywords summarizing `text`.
    pub async fn generate_anchor(&self, text: &str) -> Option<String> {
        let prompt = anchor_prompt(head_chars(text, ANCHOR_INPUT_CHARS), self.keywords_count);
        let options = GenerationOptions::with_temperature(0.1).max_tokens(50);
        match self.provider.generate(&prompt, &options).await {
            Ok(response) => {
                let anchor = parse_anchor(&response, self.keywords_count);
                match &anchor {
                    Some(anchor) => debug!("Generated anchor: {}", anchor),
                    None => warn!("Anchor response was unusable: {:?}", response),
                }
                anchor
            }
            Err(e) => {
                warn!("Anchor generation failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_output_is_cleaned() {
        assert_eq!(
            parse_anchor("关键词：价值投资，长期持有，苹果", 3).as_deref(),
            Some("价值投资、长期持有、苹果")
        );
        assert_eq!(
            parse_anchor("\"本分、平常心、企业文化、消费电子\"", 3).as_deref(),
            Some("本分、平常心、企业文化")
        );
        assert_eq!(
            parse_anchor("核心主题关键词: 投资 / 能力圈\n", 5).as_deref(),
            Some("投资、能力圈")
        );
    }

    #[test]
    fn empty_anchor_output_is_unusable() {
        assert_eq!(parse_anchor("", 3), None);
        assert_eq!(parse_anchor("  \"\"  ", 3), None);
        assert_eq!(parse_anchor("关键词：", 3), None);
    }
}
