//! # `legend-qa` Library Crate
//!
//! Command-line front end for the transcript Q&A extractor: argument parsing,
//! configuration layering, logging setup and the command handlers.

pub mod commands;
pub mod config;
pub mod logging;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use legend_qa::{types::ProviderKind, AnchorMode};
use std::path::{Path, PathBuf};

use crate::config::{get_config, AppConfig};
use crate::logging::ExtractionLogs;

// --- CLI Argument Structs ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract Q&A pairs from Chinese interview transcripts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML configuration file. Defaults to `config/config.yaml` if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Also write logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract Q&A pairs from a PDF transcript
    Extract(ExtractArgs),
    /// Extract Q&A pairs from an already extracted text file
    ExtractText(ExtractTextArgs),
    /// Check the input, output directory, configuration and model server
    Validate(ValidateArgs),
    /// Write a sample configuration file
    InitConfig(InitConfigArgs),
    /// Estimate prompt token usage for the current configuration
    Budget(BudgetArgs),
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// The PDF to process. Defaults to `input.pdf_path` from the configuration.
    pub pdf: Option<PathBuf>,
    #[command(flatten)]
    pub overrides: ExtractionOverrides,
}

#[derive(Parser, Debug)]
pub struct ExtractTextArgs {
    /// A UTF-8 text file with paragraphs separated by blank lines.
    pub text: PathBuf,
    #[command(flatten)]
    pub overrides: ExtractionOverrides,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// A PDF whose presence should be checked.
    pub pdf: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InitConfigArgs {
    /// Where to write the configuration.
    #[arg(default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub path: PathBuf,
    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct BudgetArgs {
    /// A text file whose blocks should be estimated.
    #[arg(long)]
    pub sample: Option<PathBuf>,
    /// Override `max_block_size` for the analysis.
    #[arg(long)]
    pub max_block_size: Option<usize>,
    /// Override `max_prompt_tokens` for the analysis.
    #[arg(long)]
    pub max_prompt_tokens: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderArg {
    Ollama,
    Openai,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorModeArg {
    Block,
    Pair,
}

/// Command-line overrides for a single extraction run.
#[derive(Args, Debug, Default)]
pub struct ExtractionOverrides {
    /// Output JSONL file. Overrides `output.dir` and `output.filename`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Output directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Model name.
    #[arg(long)]
    pub model: Option<String>,
    /// Model server URL.
    #[arg(long)]
    pub host: Option<String>,
    /// Model server protocol.
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,
    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f32>,
    /// Maximum block size in characters.
    #[arg(long)]
    pub max_block_size: Option<usize>,
    /// Minimum block size in characters.
    #[arg(long)]
    pub min_block_size: Option<usize>,
    /// Process only this leading fraction of blocks (0.0 - 1.0).
    #[arg(long)]
    pub sample: Option<f64>,
    /// Only process blocks that contain a Q&A exchange.
    #[arg(long, conflicts_with = "disable_qa_filter")]
    pub enable_qa_filter: bool,
    /// Process every block.
    #[arg(long)]
    pub disable_qa_filter: bool,
    /// Token ceiling for each extraction prompt.
    #[arg(long)]
    pub max_prompt_tokens: Option<usize>,
    /// Do not carry context between blocks.
    #[arg(long)]
    pub no_sliding_context: bool,
    /// Do not generate topic keywords.
    #[arg(long)]
    pub no_anchor: bool,
    /// Generate topics per block or per extracted pair.
    #[arg(long, value_enum)]
    pub anchor_mode: Option<AnchorModeArg>,
}

impl ExtractionOverrides {
    /// Applies every flag that was given on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }
        if let Some(host) = &self.host {
            config.model.host = host.clone();
        }
        if let Some(provider) = self.provider {
            config.model.kind = match provider {
                ProviderArg::Ollama => ProviderKind::Ollama,
                ProviderArg::Openai => ProviderKind::OpenAi,
            };
        }

        let extraction = &mut config.extraction;
        if let Some(temperature) = self.temperature {
            extraction.temperature = temperature;
        }
        if let Some(max) = self.max_block_size {
            extraction.max_block_size = max;
        }
        if let Some(min) = self.min_block_size {
            extraction.min_block_size = min;
        }
        if let Some(sample) = self.sample {
            extraction.extract_ratio = sample;
        }
        if self.enable_qa_filter {
            extraction.enable_qa_filter = true;
        }
        if self.disable_qa_filter {
            extraction.enable_qa_filter = false;
        }
        if let Some(tokens) = self.max_prompt_tokens {
            extraction.max_prompt_tokens = tokens;
        }
        if self.no_sliding_context {
            extraction.enable_sliding_context = false;
        }
        if self.no_anchor {
            extraction.enable_llm_anchor = false;
        }
        if let Some(mode) = self.anchor_mode {
            extraction.anchor_mode = match mode {
                AnchorModeArg::Block => AnchorMode::Block,
                AnchorModeArg::Pair => AnchorMode::Pair,
            };
        }
    }

    /// The output file for this run.
    pub fn output_path(&self, config: &AppConfig) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| config.output.resolved_path())
    }
}

impl Commands {
    /// The overrides of the commands that run an extraction.
    pub fn extraction_overrides(&self) -> Option<&ExtractionOverrides> {
        match self {
            Commands::Extract(args) => Some(&args.overrides),
            Commands::ExtractText(args) => Some(&args.overrides),
            _ => None,
        }
    }
}

/// The error and success logs of a run writing to `output`, placed next to it.
fn extraction_logs(output: &Path, config: &AppConfig) -> ExtractionLogs {
    ExtractionLogs {
        dir: output.parent().map(Path::to_path_buf).unwrap_or_default(),
        errors: config.extraction.enable_error_log,
        success: config.extraction.enable_success_log,
    }
}

impl Cli {
    /// The effective log level: `--quiet`/`--verbose`, then `--log-level`, then the configuration.
    pub fn log_level<'a>(&'a self, config: &'a AppConfig) -> &'a str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        }
    }
}

// --- Public Entrypoint ---

/// The main entry point for the `legend-qa` library.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = get_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // Extraction flags decide where the per-run logs go, so they apply before logging starts.
    let extraction_logs = cli.command.extraction_overrides().map(|overrides| {
        overrides.apply(&mut config);
        extraction_logs(&overrides.output_path(&config), &config)
    });
    let log_file = cli.log_file.as_deref().or(config.logging.file.as_deref());
    logging::init_logging(cli.log_level(&config), log_file, extraction_logs.as_ref())?;

    match cli.command {
        Commands::Extract(args) => commands::handle_extract(args, config).await,
        Commands::ExtractText(args) => commands::handle_extract_text(args, config).await,
        Commands::Validate(args) => commands::handle_validate(args, config).await,
        Commands::InitConfig(args) => commands::handle_init_config(args),
        Commands::Budget(args) => commands::handle_budget(args, config),
    }
}
