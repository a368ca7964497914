//! # Extraction Report
//!
//! Run statistics for one document. A report with zero extracted pairs is a
//! valid outcome; only document-level failures surface as errors.

use crate::{segment::char_len, tracker::TokenUsageSummary, types::QaRecord};
use serde::Serialize;
use std::collections::HashSet;

/// Why a block contributed no records.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BlockFailure {
    /// The extraction call itself failed.
    LlmCall(String),
    /// The call succeeded but no valid pair could be parsed.
    NoPairs,
}

impl std::fmt::Display for BlockFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockFailure::LlmCall(e) => write!(f, "LLM call failed: {e}"),
            BlockFailure::NoPairs => write!(f, "No Q&A pairs extracted"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BlockOutcome {
    /// Position among the processed blocks, starting at 0.
    pub index: usize,
    pub block_chars: usize,
    pub pairs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<BlockFailure>,
}

impl BlockOutcome {
    pub fn success(index: usize, block_chars: usize, pairs: usize) -> Self {
        Self {
            index,
            block_chars,
            pairs,
            failure: None,
        }
    }

    pub fn failed(index: usize, block_chars: usize, failure: BlockFailure) -> Self {
        Self {
            index,
            block_chars,
            pairs: 0,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Length statistics over the extracted pairs, in characters.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QualityMetrics {
    pub avg_question_length: f64,
    pub avg_answer_length: f64,
    pub min_question_length: usize,
    pub max_question_length: usize,
    pub min_answer_length: usize,
    pub max_answer_length: usize,
    /// Whether the same question text was extracted more than once.
    pub has_duplicate_questions: bool,
}

impl QualityMetrics {
    /// Returns `None` when there are no records.
    pub fn from_records(records: &[QaRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let questions: Vec<usize> = records.iter().map(|r| char_len(&r.question)).collect();
        let answers: Vec<usize> = records.iter().map(|r| char_len(&r.answer)).collect();
        let mut seen = HashSet::new();
        let has_duplicate_questions = !records.iter().all(|r| seen.insert(r.question.as_str()));
        let avg = |v: &[usize]| v.iter().sum::<usize>() as f64 / v.len() as f64;

        Some(Self {
            avg_question_length: avg(&questions),
            avg_answer_length: avg(&answers),
            min_question_length: questions.iter().copied().min().unwrap_or(0),
            max_question_length: questions.iter().copied().max().unwrap_or(0),
            min_answer_length: answers.iter().copied().min().unwrap_or(0),
            max_answer_length: answers.iter().copied().max().unwrap_or(0),
            has_duplicate_questions,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct ExtractionReport {
    pub model: String,
    pub total_blocks: usize,
    pub successful_blocks: usize,
    pub failed_blocks: usize,
    pub success_rate: f64,
    pub pairs_extracted: usize,
    pub avg_pairs_per_block: f64,
    pub outcomes: Vec<BlockOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsageSummary>,
}

impl ExtractionReport {
    pub fn new(
        model: &str,
        outcomes: Vec<BlockOutcome>,
        records: &[QaRecord],
        token_usage: Option<TokenUsageSummary>,
    ) -> Self {
        let total_blocks = outcomes.len();
        let successful_blocks = outcomes.iter().filter(|o| o.is_success()).count();
        let pairs_extracted = outcomes.iter().map(|o| o.pairs).sum();
        Self {
            model: model.to_string(),
            total_blocks,
            successful_blocks,
            failed_blocks: total_blocks - successful_blocks,
            success_rate: ratio(successful_blocks, total_blocks),
            pairs_extracted,
            avg_pairs_per_block: ratio(pairs_extracted, successful_blocks),
            outcomes,
            quality: QualityMetrics::from_records(records),
            token_usage,
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
