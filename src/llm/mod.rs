mod ollama;
mod openai;

use crate::config::env_string;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

/// Request to generate an assistant reply
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// The prompt text, with the chat prefix already stripped
    pub prompt: String,
    /// Maximum response length in tokens (provider-dependent)
    pub max_tokens: Option<u32>,
    /// Timeout for the request
    pub timeout: Duration,
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// The generated text
    pub text: String,
    pub metadata: ResponseMetadata,
}

/// Metadata about the LLM response
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// Name of the provider (e.g., "openai", "ollama")
    pub provider: String,
    /// Model name used
    pub model: String,
    /// Tokens consumed (if available)
    pub tokens_used: Option<u32>,
    /// Latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all LLM providers must implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a reply for the given prompt
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Configuration for LLM providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// OpenAI model to use
    pub openai_model: String,
    /// Ollama base URL
    pub ollama_base_url: Option<String>,
    /// Ollama model to use
    pub ollama_model: String,
    /// Default timeout for LLM requests
    pub default_timeout: Duration,
    /// Default max tokens for responses
    pub default_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: Some("http://localhost:11434".to_string()),
            ollama_model: "llama3.2".to_string(),
            default_timeout: Duration::from_secs(30),
            default_max_tokens: 300,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // An explicitly empty OLLAMA_BASE_URL disables Ollama
        let ollama_base_url = match std::env::var("OLLAMA_BASE_URL") {
            Ok(url) => {
                let trimmed = url.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(_) => defaults.ollama_base_url,
        };

        Self {
            openai_api_key: env_string("OPENAI_API_KEY"),
            openai_model: env_string("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            ollama_base_url,
            ollama_model: env_string("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            default_timeout: env_string("LLM_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            default_max_tokens: env_string("LLM_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_max_tokens),
        }
    }

    /// Build the provider that answers assistant prompts.
    ///
    /// OpenAI is preferred when an API key is configured, otherwise Ollama.
    pub fn build_provider(&self) -> LlmResult<Arc<dyn LlmProvider>> {
        if let Some(api_key) = &self.openai_api_key {
            return Ok(Arc::new(OpenAiProvider::new(
                api_key.clone(),
                self.openai_model.clone(),
            )));
        }

        if let Some(base_url) = &self.ollama_base_url {
            return Ok(Arc::new(OllamaProvider::new(
                base_url.clone(),
                self.ollama_model.clone(),
            )));
        }

        Err(LlmError::ConfigError(
            "No LLM provider configured. Set OPENAI_API_KEY or OLLAMA_BASE_URL".to_string(),
        ))
    }
}

/// Instructions shared by every provider
pub(crate) const ASSISTANT_SYSTEM_PROMPT: &str = "You are a helpful assistant taking part in a \
    collaborative room where people chat, write code and sketch together. \
    Answer the question directly and concisely in plain text. \
    Keep answers short enough to read comfortably in a chat window.";

/// Ask the assistant a single question and return the trimmed reply text.
///
/// The timeout is enforced here as well as inside the providers so a
/// misbehaving provider can never stall the caller past `timeout`.
pub async fn ask_assistant(
    provider: &dyn LlmProvider,
    prompt: &str,
    timeout: Duration,
    max_tokens: u32,
) -> LlmResult<String> {
    let request = GenerateRequest {
        prompt: prompt.to_string(),
        max_tokens: Some(max_tokens),
        timeout,
    };

    let response = tokio::time::timeout(timeout, provider.generate(request))
        .await
        .map_err(|_| LlmError::Timeout(timeout))??;

    tracing::debug!(
        provider = %response.metadata.provider,
        model = %response.metadata.model,
        tokens = ?response.metadata.tokens_used,
        latency_ms = response.metadata.latency_ms,
        "Assistant replied"
    );

    let text = response.text.trim();
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text.to_string())
}
