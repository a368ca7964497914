use crate::{
    errors::PromptError,
    providers::ai::{AiProvider, GenerationOptions},
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

// --- Ollama request and response structures ---

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
}

#[derive(Deserialize, Debug)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelEntry>,
}

#[derive(Deserialize, Debug)]
struct OllamaModelEntry {
    name: String,
}

// --- Ollama Provider implementation ---

/// A provider for a native Ollama server (`/api/chat`, `/api/tags`).
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: ReqwestClient,
    host: String,
    model: String,
}

impl OllamaProvider {
    /// Creates a new `OllamaProvider` for `host` (e.g. `http://localhost:11434`).
    pub fn new(host: String, model: String, timeout: Duration) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Lists the names of the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>, PromptError> {
        let url = format!("{}/api/tags", self.host);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi { status, body });
        }

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, PromptError> {
        let url = format!("{}/api/chat", self.host);

        let mut ollama_options = options.extra.clone();
        ollama_options.insert("temperature".to_string(), Value::from(options.temperature));
        if let Some(max_tokens) = options.max_tokens {
            ollama_options.insert("num_predict".to_string(), Value::from(max_tokens));
        }

        let body = OllamaChatRequest {
            model: &self.model,
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: ollama_options,
        };

        debug!("Ollama request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi { status, body });
        }

        let chat: OllamaChatResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        match chat.message {
            Some(message) if !message.content.trim().is_empty() => Ok(message.content),
            Some(_) => Err(PromptError::EmptyResponse),
            None => {
                warn!("Unexpected response format from Ollama: missing message");
                Err(PromptError::EmptyResponse)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn check_model_availability(&self) -> Result<bool, PromptError> {
        let models = self.list_models().await?;
        info!("Connected to Ollama at {}. Available models: {:?}", self.host, models);
        let available = models.iter().any(|name| name == &self.model);
        if !available {
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model, models
            );
        }
        Ok(available)
    }
}
