//! # Logging Setup
//!
//! Events go to stderr, and to a log file without ANSI colouring when one is
//! configured. `RUST_LOG` takes precedence over the configured level.
//!
//! Extraction runs also get two per-run files next to their output, fed only
//! by the pipeline's extraction targets: `extraction_errors.log` with every
//! failed block and `extraction_success.log` with every extracted pair.

use anyhow::{Context, Result};
use legend_qa::pipeline::{ERROR_LOG_TARGET, SUCCESS_LOG_TARGET};
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::Level;
use tracing_subscriber::{
    filter::{Directive, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub const ERROR_LOG_FILE: &str = "extraction_errors.log";
pub const SUCCESS_LOG_FILE: &str = "extraction_success.log";

/// The default filter: `level` for this workspace's crates only.
pub fn default_directives(level: &str) -> String {
    format!("legend_qa={level},legend_qa_cli={level},legend_qa_pdf={level}")
}

/// Where the extraction error and success logs of a run are written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionLogs {
    pub dir: PathBuf,
    pub errors: bool,
    pub success: bool,
}

impl ExtractionLogs {
    pub fn error_log_path(&self) -> PathBuf {
        self.dir.join(ERROR_LOG_FILE)
    }

    pub fn success_log_path(&self) -> PathBuf {
        self.dir.join(SUCCESS_LOG_FILE)
    }
}

/// The stderr and log-file filter. Extraction records are kept out of it.
fn console_filter(level: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(level)))
        .with_context(|| format!("Invalid log level '{level}'"))?;
    for target in [ERROR_LOG_TARGET, SUCCESS_LOG_TARGET] {
        let directive: Directive = format!("{target}=off").parse()?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

fn create_log_file(path: &Path) -> Result<Arc<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file '{}'", path.display()))?;
    Ok(Arc::new(file))
}

/// A plain-text layer writing only the events of `target` to `path`.
fn target_file_layer<S>(path: &Path, target: &str) -> Result<impl Layer<S>>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    Ok(fmt::layer()
        .with_writer(create_log_file(path)?)
        .with_ansi(false)
        .with_target(false)
        .with_filter(Targets::new().with_target(target, Level::TRACE)))
}

pub fn init_logging(
    level: &str,
    log_file: Option<&Path>,
    extraction_logs: Option<&ExtractionLogs>,
) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter(level)?);

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(create_log_file(path)?)
                .with_ansi(false)
                .with_filter(console_filter(level)?),
        ),
        None => None,
    };

    let error_layer = match extraction_logs.filter(|logs| logs.errors) {
        Some(logs) => Some(target_file_layer(&logs.error_log_path(), ERROR_LOG_TARGET)?),
        None => None,
    };
    let success_layer = match extraction_logs.filter(|logs| logs.success) {
        Some(logs) => Some(target_file_layer(&logs.success_log_path(), SUCCESS_LOG_TARGET)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(error_layer)
        .with(success_layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_every_crate() {
        let directives = default_directives("debug");
        assert_eq!(
            directives,
            "legend_qa=debug,legend_qa_cli=debug,legend_qa_pdf=debug"
        );
        assert!(EnvFilter::try_new(directives).is_ok());
    }

    #[test]
    fn extraction_logs_live_in_the_output_directory() {
        let logs = ExtractionLogs {
            dir: PathBuf::from("out"),
            errors: true,
            success: false,
        };
        assert_eq!(logs.error_log_path(), Path::new("out").join("extraction_errors.log"));
        assert_eq!(logs.success_log_path(), Path::new("out").join("extraction_success.log"));
    }
}
