//! Model registry query and supported-model selection.
//!
//! [`ModelRegistry`] is the boundary to the language-model runtime's
//! installed-model listing; [`OllamaRegistry`] implements it against
//! Ollama's `/api/tags` endpoint.  [`pick_model`] is the pure selection
//! rule shared by the readiness checker and the refiner.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::LlmConfig;
use crate::llm::refiner::LlmError;

// ---------------------------------------------------------------------------
// ModelRegistry trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the runtime's model listing.
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Names of every model the runtime currently has installed.
    async fn list_installed_models(&self) -> Result<Vec<String>, LlmError>;
}

// Compile-time assertion: Box<dyn ModelRegistry> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn ModelRegistry>) {}
};

// ---------------------------------------------------------------------------
// Model selection
// ---------------------------------------------------------------------------

/// Choose the model to refine with.
///
/// An explicit `override_name` bypasses the supported-model scan, but must
/// itself be installed — a misconfigured override fails here, with the
/// offending name in the error, rather than failing mid-run.
///
/// Without an override, the first entry of `known` (preference order) that
/// matches an installed model wins.  Matching is by substring so tag
/// variants like `llama3.2:3b-instruct-q4_K_M` still satisfy `llama3.2:3b`.
pub fn pick_model(
    installed: &[String],
    known: &[String],
    override_name: Option<&str>,
) -> Result<String, LlmError> {
    if let Some(name) = override_name {
        if installed.iter().any(|m| m.contains(name)) {
            return Ok(name.to_string());
        }
        return Err(LlmError::OverrideNotInstalled(name.to_string()));
    }

    known
        .iter()
        .find(|k| installed.iter().any(|m| m.contains(k.as_str())))
        .cloned()
        .ok_or_else(|| LlmError::NoSupportedModel(known.join(", ")))
}

/// Every `known` entry with at least one installed match, in preference
/// order.  Used by the readiness report's `found_models` list.
pub fn matching_models(installed: &[String], known: &[String]) -> Vec<String> {
    known
        .iter()
        .filter(|k| installed.iter().any(|m| m.contains(k.as_str())))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// OllamaRegistry
// ---------------------------------------------------------------------------

/// Queries Ollama's native `GET /api/tags` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaRegistry {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

impl OllamaRegistry {
    /// Build a registry client from application config.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl ModelRegistry for OllamaRegistry {
    async fn list_installed_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

// ---------------------------------------------------------------------------
// MockRegistry  (test-only)
// ---------------------------------------------------------------------------

/// A test double with a fixed installed-model listing (or a fixed error).
#[cfg(test)]
pub struct MockRegistry {
    response: Result<Vec<String>, String>,
}

#[cfg(test)]
impl MockRegistry {
    /// Mock that reports `models` as installed.
    pub fn with_models(models: &[&str]) -> Self {
        Self {
            response: Ok(models.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Mock that behaves like an unreachable runtime.
    pub fn unreachable() -> Self {
        Self {
            response: Err("connection refused".to_string()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ModelRegistry for MockRegistry {
    async fn list_installed_models(&self) -> Result<Vec<String>, LlmError> {
        self.response
            .clone()
            .map_err(LlmError::Request)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
