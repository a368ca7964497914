//! # Command Handlers

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use legend_qa::{
    budget::PromptBudgeter, providers::create_provider, ExtractionReport, JsonlWriter,
    QaExtractionPipeline, TokenUsageTracker,
};
use legend_qa_pdf::{extract_text_from_path, PdfInfo};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::{
    config::{sample_config_yaml, AppConfig},
    BudgetArgs, ExtractArgs, ExtractTextArgs, InitConfigArgs, ValidateArgs,
};

/// What the run report contains.
#[derive(Serialize, Debug)]
struct RunSummary<'a> {
    generated_at: DateTime<Utc>,
    source: &'a Path,
    output: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pdf: Option<PdfInfo>,
    report: &'a ExtractionReport,
}

/// Handles the `legend-qa extract` command logic.
///
/// `config` already carries the command's overrides.
pub async fn handle_extract(args: ExtractArgs, config: AppConfig) -> Result<()> {
    let pdf_path = args
        .pdf
        .or_else(|| config.input.pdf_path.clone())
        .context("No PDF given. Pass a path or set input.pdf_path in the configuration.")?;
    let output = args.overrides.output_path(&config);

    println!("📄 Extracting text from '{}'...", pdf_path.display());
    let (text, pdf_info) = extract_text_from_path(&pdf_path)
        .await
        .with_context(|| format!("Failed to extract text from '{}'", pdf_path.display()))?;
    if text.trim().is_empty() {
        bail!("No text could be extracted from '{}'", pdf_path.display());
    }
    info!(
        "PDF has {} pages, {} characters of text",
        pdf_info.page_count,
        text.chars().count()
    );

    run_extraction(&text, &pdf_path, Some(pdf_info), &output, &config).await
}

/// Handles the `legend-qa extract-text` command logic.
///
/// `config` already carries the command's overrides.
pub async fn handle_extract_text(args: ExtractTextArgs, config: AppConfig) -> Result<()> {
    let output = args.overrides.output_path(&config);
    let text = fs::read_to_string(&args.text)
        .with_context(|| format!("Failed to read text file '{}'", args.text.display()))?;

    run_extraction(&text, &args.text, None, &output, &config).await
}

async fn run_extraction(
    text: &str,
    source: &Path,
    pdf: Option<PdfInfo>,
    output: &Path,
    config: &AppConfig,
) -> Result<()> {
    let provider = create_provider(&config.model)?;
    let pipeline = QaExtractionPipeline::new(provider.as_ref(), config.extraction.clone())?;
    let mut writer = JsonlWriter::create(output)?;

    println!(
        "🤖 Extracting Q&A pairs with '{}' (max block {} chars)...",
        config.model.model, config.extraction.max_block_size
    );
    let report = pipeline.process_text(text, &mut writer).await?;

    let report_path = report_path(output);
    let summary = RunSummary {
        generated_at: Utc::now(),
        source,
        output,
        pdf,
        report: &report,
    };
    fs::write(&report_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("Failed to write report '{}'", report_path.display()))?;

    println!(
        "✅ Extracted {} Q&A pairs from {} blocks ({} successful, {:.1}% success rate)",
        report.pairs_extracted,
        report.total_blocks,
        report.successful_blocks,
        report.success_rate * 100.0
    );
    if let Some(quality) = &report.quality {
        println!(
            "   Average question length: {:.1} chars, average answer length: {:.1} chars",
            quality.avg_question_length, quality.avg_answer_length
        );
    }
    println!("💾 Results saved to '{}'", writer.path().display());
    println!("📊 Report saved to '{}'", report_path.display());
    Ok(())
}

/// The run report sits next to the output as `<stem>.report.json`.
fn report_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "qa_pairs".to_string());
    output.with_file_name(format!("{stem}.report.json"))
}

/// Handles the `legend-qa validate` command logic.
pub async fn handle_validate(args: ValidateArgs, config: AppConfig) -> Result<()> {
    let mut issues: Vec<String> = Vec::new();

    if let Some(pdf) = args.pdf.or_else(|| config.input.pdf_path.clone()) {
        if pdf.is_file() {
            println!("✅ PDF found: {}", pdf.display());
        } else {
            issues.push(format!("PDF file not found: {}", pdf.display()));
        }
    }

    match fs::create_dir_all(&config.output.dir) {
        Ok(()) => println!("✅ Output directory: {}", config.output.dir.display()),
        Err(e) => issues.push(format!("Cannot create output directory: {e}")),
    }

    match config.extraction.validate() {
        Ok(()) => println!("✅ Configuration is valid"),
        Err(e) => issues.push(e.to_string()),
    }

    match create_provider(&config.model) {
        Ok(provider) => match provider.check_model_availability().await {
            Ok(true) => println!(
                "✅ Model '{}' is available at {}",
                config.model.model, config.model.host
            ),
            Ok(false) => {
                warn!("Model '{}' is not installed", config.model.model);
                println!(
                    "⚠️  Connected to {}, but model '{}' was not found",
                    config.model.host, config.model.model
                );
            }
            Err(e) => issues.push(format!("Cannot connect to {}: {e}", config.model.host)),
        },
        Err(e) => issues.push(e.to_string()),
    }

    if issues.is_empty() {
        println!("✅ Setup looks good");
        Ok(())
    } else {
        for issue in &issues {
            println!("❌ {issue}");
        }
        bail!("Setup validation failed with {} issue(s)", issues.len())
    }
}

/// Handles the `legend-qa init-config` command logic.
pub fn handle_init_config(args: InitConfigArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "'{}' already exists. Use --force to overwrite it.",
            args.path.display()
        );
    }
    if let Some(parent) = args.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.path, sample_config_yaml()?)
        .with_context(|| format!("Failed to write '{}'", args.path.display()))?;
    println!("📝 Sample configuration written to '{}'", args.path.display());
    Ok(())
}

/// Handles the `legend-qa budget` command logic.
pub fn handle_budget(args: BudgetArgs, config: AppConfig) -> Result<()> {
    let mut extraction = config.extraction;
    if let Some(max) = args.max_block_size {
        extraction.max_block_size = max;
    }
    if let Some(tokens) = args.max_prompt_tokens {
        extraction.max_prompt_tokens = tokens;
    }
    extraction.validate()?;

    let analysis = PromptBudgeter::new(extraction.max_prompt_tokens)
        .with_context_chars(extraction.sliding_context_chars)
        .analyze(extraction.max_block_size);
    let fits = |ok: bool| if ok { "fits" } else { "exceeds the limit" };

    println!("📐 Prompt budget analysis");
    println!("   max_prompt_tokens: {}", analysis.max_prompt_tokens);
    println!("   max_block_size: {} chars", analysis.max_block_size);
    println!("   Full template: ~{} tokens", analysis.full_template_tokens);
    println!("   Compact template: ~{} tokens", analysis.compact_template_tokens);
    println!(
        "   Worst case with full template: ~{} tokens ({})",
        analysis.full_worst_case_tokens,
        fits(analysis.full_fits())
    );
    println!(
        "   Worst case with compact template: ~{} tokens ({})",
        analysis.compact_worst_case_tokens,
        fits(analysis.compact_fits())
    );
    println!(
        "   Recommended max_block_size: {} chars",
        analysis.recommended_max_block_size
    );

    if let Some(sample) = args.sample {
        let model = create_provider(&config.model)?;
        let pipeline = QaExtractionPipeline::new(model.as_ref(), extraction)?;
        estimate_sample(&sample, &pipeline)?;
    }
    Ok(())
}

/// Estimates the prompts of the blocks an extraction of `path` would send.
fn estimate_sample(path: &Path, pipeline: &QaExtractionPipeline<'_>) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read sample '{}'", path.display()))?;
    let blocks = pipeline.prepare_blocks(&text);
    let extraction = pipeline.config();
    let budgeter = pipeline.budgeter();

    let mut tracker = TokenUsageTracker::new(extraction.max_prompt_tokens);
    let mut previous: Option<&str> = None;
    for block in &blocks {
        let context = previous.filter(|_| extraction.enable_sliding_context);
        tracker.record(&budgeter.assemble(&block.content, context, None));
        previous = Some(block.content.as_str());
    }

    let summary = tracker.summary();
    println!("📄 Sample '{}': {} blocks", path.display(), blocks.len());
    println!(
        "   Average prompt: ~{:.0} tokens ({:.1}% of the limit, {})",
        summary.avg_tokens, summary.avg_utilization, summary.health
    );
    println!(
        "   Largest prompt: ~{} tokens, truncations: {}",
        summary.max_tokens, summary.truncations
    );
    for (variant, count) in &summary.variants {
        println!("   {variant}: {count}");
    }
    Ok(())
}
