//! # Extraction Configuration
//!
//! The options that shape segmentation, metadata and prompt budgeting. Loading
//! from files and the environment is the caller's concern; this module only
//! defines the values, their defaults and validation.

use crate::segment::{BlockBounds, QaRuleTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid configuration, detected before any processing begins.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("min_block_size ({min}) must not exceed max_block_size ({max})")]
    BlockBoundsInverted { min: usize, max: usize },
    #[error("max_block_size must be greater than zero")]
    ZeroMaxBlockSize,
    #[error("qa_allowance_ratio must be at least 1.0, got {0}")]
    AllowanceBelowOne(f64),
    #[error("extract_ratio must be within [0.0, 1.0], got {0}")]
    ExtractRatioOutOfRange(f64),
    #[error("anchor_keywords_count must be greater than zero when anchors are enabled")]
    ZeroAnchorKeywords,
    #[error("max_prompt_tokens must be greater than zero")]
    ZeroPromptTokens,
    #[error("Invalid QA rule pattern: {0}")]
    InvalidRule(String),
}

/// Where topic anchors are generated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    /// One anchor per block, shown to the model as a topic hint and copied to every pair.
    Block,
    /// One topic per extracted pair, derived from its question and answer.
    #[default]
    Pair,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Nominal block ceiling, in characters.
    pub max_block_size: usize,
    /// Blocks shorter than this are discarded, in characters.
    pub min_block_size: usize,
    /// Q&A blocks may grow up to `max_block_size * qa_allowance_ratio`.
    pub qa_allowance_ratio: f64,
    pub enable_sliding_context: bool,
    /// How many trailing characters of the previous block are carried forward.
    /// Values above 200 are capped.
    pub sliding_context_chars: usize,
    pub enable_llm_anchor: bool,
    pub anchor_keywords_count: usize,
    pub anchor_mode: AnchorMode,
    pub max_prompt_tokens: usize,
    pub enable_qa_filter: bool,
    /// Leading fraction of blocks to process.
    pub extract_ratio: f64,
    pub temperature: f32,
    pub enable_token_monitoring: bool,
    /// Emit each failed block, with the model's reply, under [`ERROR_LOG_TARGET`].
    ///
    /// [`ERROR_LOG_TARGET`]: crate::pipeline::ERROR_LOG_TARGET
    pub enable_error_log: bool,
    /// Emit each extracted pair, with its source block, under [`SUCCESS_LOG_TARGET`].
    ///
    /// [`SUCCESS_LOG_TARGET`]: crate::pipeline::SUCCESS_LOG_TARGET
    pub enable_success_log: bool,
    pub rules: QaRuleTable,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_block_size: 1500,
            min_block_size: 100,
            qa_allowance_ratio: 1.2,
            enable_sliding_context: true,
            sliding_context_chars: 200,
            enable_llm_anchor: true,
            anchor_keywords_count: 3,
            anchor_mode: AnchorMode::Pair,
            max_prompt_tokens: 4000,
            enable_qa_filter: false,
            extract_ratio: 1.0,
            temperature: 0.1,
            enable_token_monitoring: true,
            enable_error_log: true,
            enable_success_log: true,
            rules: QaRuleTable::default(),
        }
    }
}

impl ExtractionConfig {
    /// Checks every option that would otherwise produce undefined segmentation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_block_size == 0 {
            return Err(ConfigError::ZeroMaxBlockSize);
        }
        if self.min_block_size > self.max_block_size {
            return Err(ConfigError::BlockBoundsInverted {
                min: self.min_block_size,
                max: self.max_block_size,
            });
        }
        if self.qa_allowance_ratio.is_nan() || self.qa_allowance_ratio < 1.0 {
            return Err(ConfigError::AllowanceBelowOne(self.qa_allowance_ratio));
        }
        if !(0.0..=1.0).contains(&self.extract_ratio) {
            return Err(ConfigError::ExtractRatioOutOfRange(self.extract_ratio));
        }
        if self.enable_llm_anchor && self.anchor_keywords_count == 0 {
            return Err(ConfigError::ZeroAnchorKeywords);
        }
        if self.max_prompt_tokens == 0 {
            return Err(ConfigError::ZeroPromptTokens);
        }
        Ok(())
    }

    pub fn block_bounds(&self) -> BlockBounds {
        BlockBounds {
            min_size: self.min_block_size,
            max_size: self.max_block_size,
            qa_allowance_ratio: self.qa_allowance_ratio,
        }
    }
}
