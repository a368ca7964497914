//! # Extraction Pipeline
//!
//! Drives one document through every stage, strictly in document order:
//!
//! preprocess → split → build blocks → (QA filter) → sample → metadata →
//! per block: budget prompt, call the model, parse, persist.
//!
//! Per-block failures (a failed call, an unparseable answer) are recorded in
//! the report and processing continues with the next block. Only failures
//! that affect the whole document, such as invalid configuration or a broken
//! output sink, are returned as errors.
//!
//! Besides the regular log lines, failed blocks and extracted pairs are
//! emitted in full under [`ERROR_LOG_TARGET`] and [`SUCCESS_LOG_TARGET`], so a
//! subscriber can route them to dedicated files.

use crate::{
    budget::PromptBudgeter,
    config::{AnchorMode, ConfigError, ExtractionConfig},
    extract::{into_records, parse_qa_response},
    metadata::MetadataGenerator,
    output::{OutputError, RecordSink},
    prompts::anchor::pair_topic_text,
    providers::ai::{AiProvider, GenerationOptions},
    report::{BlockFailure, BlockOutcome, ExtractionReport},
    segment::{
        filter_qa_blocks, preprocess_qa_text, sample_leading, split_paragraphs, Block,
        HybridBlockBuilder, QaRules,
    },
    tracker::TokenUsageTracker,
    types::QaRecord,
};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Target of the events describing failed blocks.
pub const ERROR_LOG_TARGET: &str = "legend_qa::extraction_errors";
/// Target of the events describing extracted pairs.
pub const SUCCESS_LOG_TARGET: &str = "legend_qa::extraction_success";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid extraction configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to persist extracted records: {0}")]
    Output(#[from] OutputError),
}

#[derive(Debug)]
pub struct QaExtractionPipeline<'a> {
    provider: &'a dyn AiProvider,
    config: ExtractionConfig,
    rules: QaRules,
    budgeter: PromptBudgeter,
}

impl<'a> QaExtractionPipeline<'a> {
    /// Validates `config` and compiles its rule table.
    pub fn new(provider: &'a dyn AiProvider, config: ExtractionConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let rules = QaRules::compile(&config.rules)?;
        let budgeter = PromptBudgeter::new(config.max_prompt_tokens)
            .with_context_chars(config.sliding_context_chars);
        Ok(Self {
            provider,
            config,
            rules,
            budgeter,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn rules(&self) -> &QaRules {
        &self.rules
    }

    pub fn budgeter(&self) -> &PromptBudgeter {
        &self.budgeter
    }

    /// Preprocesses `text` and partitions it into blocks.
    pub fn segment(&self, text: &str) -> Vec<Block> {
        let text = preprocess_qa_text(text);
        let paragraphs = split_paragraphs(&text);
        info!("Split text into {} paragraphs", paragraphs.len());
        HybridBlockBuilder::new(self.config.block_bounds(), &self.rules).build(&paragraphs)
    }

    /// Segments `text`, then applies the QA filter and sampling.
    pub fn prepare_blocks(&self, text: &str) -> Vec<Block> {
        let mut blocks = self.segment(text);
        if self.config.enable_qa_filter {
            blocks = filter_qa_blocks(blocks, &self.rules);
        }
        sample_leading(blocks, self.config.extract_ratio)
    }

    /// Runs the whole pipeline over an extracted document.
    #[instrument(skip_all, fields(model = self.provider.model_name()))]
    pub async fn process_text(
        &self,
        text: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<ExtractionReport, PipelineError> {
        let blocks = self.prepare_blocks(text);
        self.process_blocks(blocks, sink).await
    }

    /// Enriches `blocks` and extracts records from each of them, in order.
    pub async fn process_blocks(
        &self,
        blocks: Vec<Block>,
        sink: &mut dyn RecordSink,
    ) -> Result<ExtractionReport, PipelineError> {
        if blocks.is_empty() {
            warn!("No text blocks to process");
            return Ok(ExtractionReport::new(
                self.provider.model_name(),
                Vec::new(),
                &[],
                None,
            ));
        }
        log_block_sizes(&blocks);

        let metadata = MetadataGenerator::new(self.provider, &self.config);
        let blocks = metadata.enrich(blocks).await;
        let pair_topics = self.config.enable_llm_anchor && self.config.anchor_mode == AnchorMode::Pair;
        let options = GenerationOptions::with_temperature(self.config.temperature);
        let mut tracker = TokenUsageTracker::new(self.config.max_prompt_tokens);
        let mut outcomes = Vec::with_capacity(blocks.len());
        let mut all_records: Vec<QaRecord> = Vec::new();
        let total = blocks.len();

        for (index, block) in blocks.iter().enumerate() {
            let block_chars = block.char_len();
            let prompt = self.budgeter.assemble(
                &block.content,
                block.sliding_context.as_deref(),
                block.anchor.as_deref(),
            );
            if self.config.enable_token_monitoring {
                tracker.record(&prompt);
            }

            let response = match self.provider.generate(&prompt.text, &options).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Block {}/{}: LLM call failed: {}", index + 1, total, e);
                    if self.config.enable_error_log {
                        error!(
                            target: ERROR_LOG_TARGET,
                            "LLM call failed for block {}: {}\nBlock content:\n{}",
                            index + 1,
                            e,
                            block.content
                        );
                    }
                    outcomes.push(BlockOutcome::failed(
                        index,
                        block_chars,
                        BlockFailure::LlmCall(e.to_string()),
                    ));
                    continue;
                }
            };

            let mut records = into_records(parse_qa_response(&response), block, &self.rules);
            if records.is_empty() {
                warn!("Block {}/{}: No Q&A pairs extracted", index + 1, total);
                debug!("Unusable response for block {}: {}", index + 1, response);
                if self.config.enable_error_log {
                    error!(
                        target: ERROR_LOG_TARGET,
                        "No valid Q&A pairs extracted for block {}\nLLM response: {}\nBlock content:\n{}",
                        index + 1,
                        response,
                        block.content
                    );
                }
                outcomes.push(BlockOutcome::failed(index, block_chars, BlockFailure::NoPairs));
                continue;
            }

            if pair_topics {
                for record in &mut records {
                    record.topic = metadata
                        .generate_anchor(&pair_topic_text(&record.question, &record.answer))
                        .await;
                }
            }

            for record in &records {
                sink.write_record(record)?;
            }
            info!(
                "Block {}/{}: Extracted {} Q&A pairs",
                index + 1,
                total,
                records.len()
            );
            if self.config.enable_success_log {
                for (offset, record) in records.iter().enumerate() {
                    info!(
                        target: SUCCESS_LOG_TARGET,
                        "Q&A pair #{} from block {}\n\nQuestion: {}\n\nAnswer: {}\n\nSource block:\n{}",
                        all_records.len() + offset + 1,
                        index + 1,
                        record.question,
                        record.answer,
                        block.content
                    );
                }
            }
            outcomes.push(BlockOutcome::success(index, block_chars, records.len()));
            all_records.extend(records);
        }

        let token_usage = if self.config.enable_token_monitoring {
            tracker.log_summary();
            Some(tracker.summary())
        } else {
            None
        };
        let report = ExtractionReport::new(
            self.provider.model_name(),
            outcomes,
            &all_records,
            token_usage,
        );
        info!(
            "Processed {} blocks: {} successful, {} Q&A pairs",
            report.total_blocks, report.successful_blocks, report.pairs_extracted
        );
        Ok(report)
    }
}

fn log_block_sizes(blocks: &[Block]) {
    let sizes: Vec<usize> = blocks.iter().map(Block::char_len).collect();
    let average = sizes.iter().sum::<usize>() as f64 / sizes.len() as f64;
    debug!("Block sizes: {:?}", sizes);
    debug!("Average block size: {:.1} chars", average);
}
