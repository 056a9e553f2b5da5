//! Core `TextRefiner` trait and `OllamaRefiner` implementation.
//!
//! `OllamaRefiner` calls an OpenAI-compatible `/v1/chat/completions`
//! endpoint — Ollama in OpenAI mode by default, but any provider speaking
//! the same wire format works.  All connection details come from
//! [`LlmConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::LlmConfig;
use crate::llm::registry::{pick_model, ModelRegistry, OllamaRegistry};

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the language-model runtime.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The LLM returned a response with no usable text content.
    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// The configured model override is not among the installed models.
    #[error("configured model '{0}' is not installed")]
    OverrideNotInstalled(String),

    /// No entry of the supported-model list is installed.
    #[error("no supported model found — pull one of: {0}")]
    NoSupportedModel(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// TextRefiner trait
// ---------------------------------------------------------------------------

/// Async trait for LLM-based text cleanup.
///
/// Implementors must be `Send + Sync` so they can be shared across stage
/// runs (wrapped in `Arc<dyn TextRefiner>`).  Each call is stateless:
/// `chunk` carries everything the model needs.
#[async_trait]
pub trait TextRefiner: Send + Sync {
    async fn refine(&self, chunk: &str) -> Result<String, LlmError>;
}

// Compile-time assertion: Box<dyn TextRefiner> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TextRefiner>) {}
};

// ---------------------------------------------------------------------------
// OllamaRefiner
// ---------------------------------------------------------------------------

/// Instruction given to the model for every chunk.  Narration cleanup only —
/// the model must not rewrite content.
const SYSTEM_PROMPT: &str = "You are a professional editor. Remove citations, page numbers, \
     and image captions. Join words split by hyphens. Do not change the content. \
     Retain headers. Do not add any text.";

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// The model identifier is resolved lazily on first use: the configured
/// override when present, otherwise the first supported model the runtime
/// reports as installed.  Resolution happens once per process — a stage run
/// with dozens of chunks performs a single registry query.
pub struct OllamaRefiner {
    client: reqwest::Client,
    config: LlmConfig,
    registry: OllamaRegistry,
    model: OnceCell<String>,
}

impl OllamaRefiner {
    /// Build an `OllamaRefiner` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            registry: OllamaRegistry::from_config(config),
            config: config.clone(),
            model: OnceCell::new(),
        }
    }

    async fn resolve_model(&self) -> Result<&str, LlmError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let installed = self.registry.list_installed_models().await?;
                pick_model(
                    &installed,
                    &self.config.known_models,
                    self.config.model_override.as_deref(),
                )
            })
            .await?;
        Ok(model.as_str())
    }
}

#[async_trait]
impl TextRefiner for OllamaRefiner {
    async fn refine(&self, chunk: &str) -> Result<String, LlmError> {
        let model = self.resolve_model().await?;
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user",   "content": format!("Clean this for TTS: \n\n{chunk}") }
            ],
            "stream":      false,
            "temperature": self.config.temperature
        });

        let response = self.client.post(&url).json(&body).send().await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let cleaned = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(LlmError::EmptyResponse)?
            .trim()
            .to_string();

        if cleaned.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(cleaned)
    }
}

// ---------------------------------------------------------------------------
// MockRefiner  (test-only)
// ---------------------------------------------------------------------------

/// A test double for the refinement boundary.
///
/// Echoes each chunk back (trimmed), optionally after a delay, or fails
/// every call — enough to exercise the orchestrator's success, failure and
/// mutual-exclusion paths.
#[cfg(test)]
pub struct MockRefiner {
    delay: std::time::Duration,
    fail: bool,
}

#[cfg(test)]
impl MockRefiner {
    /// Mock that echoes every chunk immediately.
    pub fn ok() -> Self {
        Self {
            delay: std::time::Duration::ZERO,
            fail: false,
        }
    }

    /// Mock that echoes after sleeping `delay` per chunk.
    pub fn slow(delay: std::time::Duration) -> Self {
        Self { delay, fail: false }
    }

    /// Mock that fails every call.
    pub fn failing() -> Self {
        Self {
            delay: std::time::Duration::ZERO,
            fail: true,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl TextRefiner for MockRefiner {
    async fn refine(&self, chunk: &str) -> Result<String, LlmError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(LlmError::Request("mock refinement failure".into()));
        }
        Ok(chunk.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
