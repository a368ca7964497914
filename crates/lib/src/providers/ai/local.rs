use crate::{
    errors::PromptError,
    providers::ai::{AiProvider, GenerationOptions},
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::time::Duration;
use tracing::debug;

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct LocalAiRequest<'a> {
    messages: Vec<LocalAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LocalAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct LocalAiResponse {
    choices: Vec<LocalAiChoice>,
}

#[derive(Deserialize, Debug)]
struct LocalAiChoice {
    message: LocalAiMessage,
}

#[derive(Deserialize, Debug)]
struct LocalAiModelList {
    #[serde(default)]
    data: Vec<LocalAiModel>,
}

#[derive(Deserialize, Debug)]
struct LocalAiModel {
    id: String,
}

// --- Local Provider implementation ---

/// A provider for a local or OpenAI-compatible `chat/completions` API.
#[derive(Clone, Debug)]
pub struct LocalAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl LocalAiProvider {
    /// Creates a new `LocalAiProvider`.
    ///
    /// `api_url` is the full endpoint, e.g. `http://localhost:8080/v1/chat/completions`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }

    /// The `models` listing next to a `.../chat/completions` endpoint.
    fn models_url(&self) -> Option<String> {
        self.api_url
            .trim_end_matches('/')
            .strip_suffix("/chat/completions")
            .map(|base| format!("{base}/models"))
    }
}

#[async_trait]
impl AiProvider for LocalAiProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, PromptError> {
        let request_body = LocalAiRequest {
            messages: vec![LocalAiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            model: (!self.model.is_empty()).then_some(self.model.as_str()),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
            extra: &options.extra,
        };

        let mut request_builder = self.client.post(&self.api_url);

        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        debug!("Local AI request to {}", self.api_url);

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi { status, body });
        }

        let local_ai_response: LocalAiResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        local_ai_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(PromptError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn check_model_availability(&self) -> Result<bool, PromptError> {
        let Some(url) = self.models_url() else {
            return Ok(true);
        };
        let mut request_builder = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }
        let response = request_builder
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi { status, body });
        }

        let list: LocalAiModelList = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;
        // Single-model servers accept requests without a model name.
        if self.model.is_empty() {
            return Ok(true);
        }
        Ok(list.data.iter().any(|m| m.id == self.model))
    }
}
