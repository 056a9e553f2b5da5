//! Required model-asset catalog and presence checks.
//!
//! The synthesis runtime needs large binary model files on disk.  Which
//! files, and where to fetch them, is configuration data ([`AssetSpec`]
//! entries in `settings.toml`) — [`default_assets`] provides the stock
//! Kokoro v1.0 set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AssetSpec
// ---------------------------------------------------------------------------

/// One required asset file: its on-disk name and its download location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    /// File name under the models directory (e.g. `"kokoro-v1.0.onnx"`).
    pub name: String,
    /// Remote URL the file is fetched from when missing.
    pub url: String,
}

impl AssetSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Where this asset lives under `models_dir`.
    pub fn local_path(&self, models_dir: &Path) -> PathBuf {
        models_dir.join(&self.name)
    }
}

/// The stock Kokoro v1.0 asset set.
pub fn default_assets() -> Vec<AssetSpec> {
    vec![
        AssetSpec::new(
            "kokoro-v1.0.onnx",
            "https://github.com/nazdridoy/kokoro-tts/releases/download/v1.0.0/kokoro-v1.0.onnx",
        ),
        AssetSpec::new(
            "voices-v1.0.bin",
            "https://github.com/nazdridoy/kokoro-tts/releases/download/v1.0.0/voices-v1.0.bin",
        ),
    ]
}

// ---------------------------------------------------------------------------
// Presence checks
// ---------------------------------------------------------------------------

/// `true` when the file exists and is non-empty.  A zero-byte file is the
/// leftover of an interrupted transfer and counts as absent.
pub fn is_present(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// The subset of `specs` not present under `models_dir`, in catalog order.
pub fn missing_assets<'a>(specs: &'a [AssetSpec], models_dir: &Path) -> Vec<&'a AssetSpec> {
    specs
        .iter()
        .filter(|spec| !is_present(&spec.local_path(models_dir)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
