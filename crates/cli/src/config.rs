//! # Application Configuration
//!
//! Defines the configuration of the `legend-qa` command and loads it in
//! layers, each overriding the previous one:
//!
//! 1. Programmatic defaults.
//! 2. A YAML file (`--config`, or `config/config.yaml` when present), with
//!    `${VAR}` placeholders substituted from the environment.
//! 3. `LEGEND_QA_`-prefixed environment variables, `__` separating nested keys
//!    (e.g. `LEGEND_QA_EXTRACTION__MAX_BLOCK_SIZE`).
//! 4. The flat variables of earlier releases (`OLLAMA_HOST`, `MAX_BLOCK_SIZE`, ...).
//!
//! Command-line flags are applied on top by the command handlers.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use legend_qa::{types::ProviderSettings, ExtractionConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// The configuration file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates an explicitly requested configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct InputConfig {
    /// PDF processed by `extract` when no path is given on the command line.
    pub pdf_path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Relative to `dir` unless absolute.
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            filename: "qa_pairs.jsonl".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn resolved_path(&self) -> PathBuf {
        let filename = Path::new(&self.filename);
        if filename.is_absolute() {
            filename.to_path_buf()
        } else {
            self.dir.join(filename)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// The root configuration structure, mapping directly to `config.yaml`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub model: ProviderSettings,
    pub extraction: ExtractionConfig,
    pub logging: LoggingConfig,
}

/// Flat environment variables understood for compatibility, and the key each one sets.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("OLLAMA_HOST", "model.host"),
    ("OLLAMA_MODEL", "model.model"),
    ("MODEL_TEMPERATURE", "extraction.temperature"),
    ("MAX_BLOCK_SIZE", "extraction.max_block_size"),
    ("MIN_BLOCK_SIZE", "extraction.min_block_size"),
    ("EXTRACT_RATIO", "extraction.extract_ratio"),
    ("ENABLE_QA_FILTER", "extraction.enable_qa_filter"),
    ("OUTPUT_DIR", "output.dir"),
    ("OUTPUT_FILENAME", "output.filename"),
    ("LOG_LEVEL", "logging.level"),
];

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::General(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").unwrap();
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from defaults, a file and the environment.
///
/// An explicitly requested file must exist; the default location is optional.
pub fn get_config(config_path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let defaults = ConfigBuilder::try_from(&AppConfig::default())?;
    let mut builder = ConfigBuilder::builder().add_source(defaults);

    match config_path_override {
        Some(path) => {
            let content = read_and_substitute(path)?.ok_or_else(|| {
                ConfigError::NotFound(format!("Config file not found at '{}'.", path.display()))
            })?;
            info!("Loading configuration from '{}'.", path.display());
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if let Some(content) = read_and_substitute(default_path)? {
                info!("Loading configuration from '{DEFAULT_CONFIG_PATH}'.");
                builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
            }
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("LEGEND_QA")
            .prefix_separator("_")
            .try_parsing(true)
            .separator("__"),
    );

    for (var, key) in LEGACY_ENV_KEYS {
        let value = env::var(var).ok().filter(|v| !v.is_empty());
        builder = builder.set_override_option(*key, value)?;
    }

    let settings = builder.build()?;
    let config: AppConfig = settings.try_deserialize()?;
    Ok(config)
}

/// Renders the full default configuration as YAML.
pub fn sample_config_yaml() -> Result<String, ConfigError> {
    serde_yaml::to_string(&AppConfig::default())
        .map_err(|e| ConfigError::General(format!("Failed to render sample config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_joins_relative_filenames() {
        let output = OutputConfig::default();
        assert_eq!(
            output.resolved_path(),
            PathBuf::from("output").join("qa_pairs.jsonl")
        );

        let absolute = OutputConfig {
            filename: "/tmp/qa.jsonl".to_string(),
            ..OutputConfig::default()
        };
        assert_eq!(absolute.resolved_path(), PathBuf::from("/tmp/qa.jsonl"));
    }

    #[test]
    fn sample_config_round_trips() -> Result<(), Box<dyn std::error::Error>> {
        let yaml = sample_config_yaml()?;
        assert!(yaml.contains("max_block_size: 1500"));
        let parsed: AppConfig = serde_yaml::from_str(&yaml)?;
        assert_eq!(parsed, AppConfig::default());
        Ok(())
    }
}
