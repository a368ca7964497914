use serde::{Deserialize, Serialize};

/// A persisted question–answer pair, written as one JSON line.
///
/// `source_text` is always the full content of the block the pair was
/// extracted from, verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
    pub source_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sliding_context: Option<String>,
}

/// The wire protocol spoken by an AI provider.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Native Ollama `/api/chat` endpoint.
    #[default]
    Ollama,
    /// Any OpenAI-compatible `chat/completions` endpoint (llama.cpp, vLLM, LM Studio).
    OpenAi,
}

/// Connection settings for the AI provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Base URL for Ollama, or the full `chat/completions` URL for OpenAI-compatible servers.
    pub host: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Ollama,
            host: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            api_key: None,
            timeout_secs: 300,
        }
    }
}
