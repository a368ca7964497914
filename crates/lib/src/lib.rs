//! # Transcript Q&A Extraction
//!
//! This crate turns long-form Chinese interview and dialogue transcripts into
//! structured question–answer pairs, using a locally hosted LLM as the
//! extraction engine.
//!
//! The work is split into forward-only stages:
//!
//! 1.  **Segmentation** (`segment`): paragraphs are merged into size-bounded blocks,
//!     with a relaxed ceiling for blocks that carry a Q&A exchange.
//! 2.  **Filtering & Sampling** (`segment::filter`): blocks without Q&A signal can be
//!     dropped, and a leading fraction of blocks can be selected.
//! 3.  **Metadata** (`metadata`): sliding context from the previous block and an
//!     optional LLM-generated topic anchor.
//! 4.  **Prompt Budgeting** (`budget`): full or compact template, smart truncation,
//!     always within the configured token ceiling where possible.
//! 5.  **Extraction** (`pipeline`, `extract`): the LLM is called per block and its
//!     free-form JSON answer is parsed into records written as JSON lines.

pub mod budget;
pub mod config;
pub mod errors;
pub mod extract;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod report;
pub mod segment;
pub mod tracker;
pub mod types;

pub use budget::{estimate_tokens, smart_truncate, BudgetedPrompt, PromptBudgeter, PromptVariant};
pub use config::{AnchorMode, ConfigError, ExtractionConfig};
pub use errors::PromptError;
pub use output::{JsonlWriter, OutputError, RecordSink};
pub use pipeline::{PipelineError, QaExtractionPipeline};
pub use report::{BlockFailure, BlockOutcome, ExtractionReport, QualityMetrics};
pub use segment::{Block, HybridBlockBuilder, QaRuleTable, QaRules};
pub use tracker::{TokenUsageSummary, TokenUsageTracker};
pub use types::QaRecord;
