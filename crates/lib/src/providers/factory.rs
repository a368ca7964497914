//! # AI Provider Factory
//!
//! Centralizes the creation of AI provider instances from configuration, so the
//! CLI and tests build providers the same way.

use crate::{
    errors::PromptError,
    providers::ai::{local::LocalAiProvider, ollama::OllamaProvider, AiProvider},
    types::{ProviderKind, ProviderSettings},
};
use std::time::Duration;
use tracing::info;

/// Creates the AI provider described by `settings`.
pub fn create_provider(settings: &ProviderSettings) -> Result<Box<dyn AiProvider>, PromptError> {
    if settings.host.trim().is_empty() {
        return Err(PromptError::MissingAiProvider(
            "the provider host/URL is empty".to_string(),
        ));
    }
    let timeout = Duration::from_secs(settings.timeout_secs.max(1));

    let provider: Box<dyn AiProvider> = match settings.kind {
        ProviderKind::Ollama => {
            if settings.model.trim().is_empty() {
                return Err(PromptError::MissingAiProvider(
                    "a model name is required for Ollama".to_string(),
                ));
            }
            info!(
                "Configuring Ollama provider at {} with model '{}'",
                settings.host, settings.model
            );
            Box::new(OllamaProvider::new(
                settings.host.clone(),
                settings.model.clone(),
                timeout,
            )?)
        }
        ProviderKind::OpenAi => {
            info!(
                "Configuring OpenAI-compatible provider at {} with model '{}'",
                settings.host, settings.model
            );
            Box::new(LocalAiProvider::new(
                settings.host.clone(),
                settings.api_key.clone(),
                settings.model.clone(),
                timeout,
            )?)
        }
    };

    Ok(provider)
}
