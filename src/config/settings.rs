//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//!
//! The supported-model preference list and the required asset list are
//! configuration data, not code — orchestration logic never branches on a
//! hard-coded model name.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::assets::{default_assets, AssetSpec};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Bind address for the local HTTP service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.  The service is a local companion backend; keep
    /// this on a loopback address unless you know what you are doing.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the text-refinement language model (Ollama).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the Ollama runtime.
    pub base_url: String,
    /// Explicit model override.  When set, the supported-model scan is
    /// bypassed entirely — but the override must still be installed, so a
    /// typo here fails the readiness check instead of failing mid-run.
    pub model_override: Option<String>,
    /// Supported models in preference order; the first installed entry is
    /// used when no override is configured.
    pub known_models: Vec<String>,
    /// Sampling temperature (0.0 – 1.0).  Lower = more deterministic.
    pub temperature: f32,
    /// Maximum seconds to wait for one chat completion.
    pub timeout_secs: u64,
}

/// Curated model identifiers known to handle the cleanup prompt well,
/// ordered by preference.
fn default_known_models() -> Vec<String> {
    [
        "qwen3:0.6b",
        "qwen3:1.7b",
        "qwen3:4b",
        "llama3.2:1b",
        "llama3.2:3b",
        "llama4:8b",
        "gemma3:1b",
        "gemma3:4b",
        "gemma3:12b",
        "phi3.5:latest",
        "phi4:14b",
        "phi4-mini-instruct",
        "mistral:7b",
        "mistral-small3.2:24b",
        "smollm3:3b",
        "liquid-lfm:1.2b",
        "lfm2.5-thinking:1.2b",
        "granite4:1b",
        "granite4:3b",
        "deepseek-v3.2-exp:7b",
        "ministral-3:3b",
        "ministral-3:8b",
        "glm-4.7-flash",
        "rnj-1:8b",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model_override: None,
            known_models: default_known_models(),
            temperature: 0.3,
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// RefineConfig
// ---------------------------------------------------------------------------

/// Settings for the refinement stage's chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Maximum characters handed to the language model per call.
    pub chunk_chars: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self { chunk_chars: 2_000 }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-synthesis runtime (local Kokoro server).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Base URL of the Kokoro speech server.
    pub base_url: String,
    /// Voice identifier passed to the runtime.
    pub voice: String,
    /// Playback speed multiplier.
    pub speed: f32,
    /// Maximum seconds to wait for one synthesis call.
    pub timeout_secs: u64,
    /// Maximum characters per synthesis unit; short sentences are merged
    /// with neighbours up to this length.
    pub max_chunk_chars: usize,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8880".into(),
            voice: "af_sky".into(),
            speed: 1.0,
            timeout_secs: 120,
            max_chunk_chars: 400,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use doctalk::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP service settings.
    pub server: ServerConfig,
    /// Language-model settings.
    pub llm: LlmConfig,
    /// Refinement chunker settings.
    pub refine: RefineConfig,
    /// Speech-synthesis settings.
    pub tts: TtsConfig,
    /// Asset files the synthesis runtime requires on disk, with their
    /// download locations.
    pub assets: Vec<AssetSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            refine: RefineConfig::default(),
            tts: TtsConfig::default(),
            assets: default_assets(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
