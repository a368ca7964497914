pub mod local;
pub mod ollama;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Per-call generation options forwarded to the provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    /// Upper bound on generated tokens, if the provider supports one.
    pub max_tokens: Option<u32>,
    /// Provider-specific options passed through untouched.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl GenerationOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            max_tokens: None,
            extra: Map::new(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::with_temperature(0.1)
    }
}

/// A trait for interacting with an AI provider.
///
/// This is the only seam between the extraction core and the LLM transport.
/// Retries, pooling and model management belong to implementations; callers
/// treat any `Err` as a recoverable, per-call failure.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Sends a single user prompt and returns the raw response text.
    async fn generate(&self, prompt: &str, options: &GenerationOptions)
        -> Result<String, PromptError>;

    /// The model this provider is configured for, used in logs and reports.
    fn model_name(&self) -> &str;

    /// Checks whether the configured model is available on the server.
    ///
    /// An `Err` means the server could not be reached at all.
    async fn check_model_availability(&self) -> Result<bool, PromptError> {
        Ok(true)
    }
}

dyn_clone::clone_trait_object!(AiProvider);
