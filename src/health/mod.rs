//! Dependency readiness checks.
//!
//! Two independent, side-effect-free checks composed into one report:
//! whether the language-model runtime exposes a usable model, and whether
//! the synthesis runtime's asset files are on disk.  Every check is a fresh
//! snapshot taken at call time — nothing is cached or subscribed, so
//! clients may poll at any rate ("re-check" buttons, liveness probes).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::{is_present, AssetSpec};
use crate::llm::{matching_models, ModelRegistry};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Result of the language-model check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmReadiness {
    pub ok: bool,
    /// Human-readable outcome: the chosen model, or what to remediate.
    pub detail: String,
    /// Supported models found installed, in preference order.
    pub found_models: Vec<String>,
}

/// Result of the asset-file check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetReadiness {
    pub ok: bool,
    /// Per-file presence, keyed by file name.
    pub files: BTreeMap<String, bool>,
}

/// Combined snapshot of both dependency checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub ok: bool,
    pub llm: LlmReadiness,
    pub assets: AssetReadiness,
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Check that the language-model runtime is reachable and has a usable
/// model.
///
/// An `override_name` bypasses the supported-model scan but must itself be
/// installed; the failure detail names the override so a misconfiguration
/// is visible at a glance.
pub async fn check_llm(
    registry: &dyn ModelRegistry,
    known: &[String],
    override_name: Option<&str>,
) -> LlmReadiness {
    let installed = match registry.list_installed_models().await {
        Ok(models) => models,
        Err(e) => {
            return LlmReadiness {
                ok: false,
                detail: format!("language-model runtime not reachable: {e}"),
                found_models: Vec::new(),
            }
        }
    };

    let found = matching_models(&installed, known);

    if let Some(name) = override_name {
        if installed.iter().any(|m| m.contains(name)) {
            return LlmReadiness {
                ok: true,
                detail: format!("using configured model '{name}'"),
                found_models: vec![name.to_string()],
            };
        }
        return LlmReadiness {
            ok: false,
            detail: format!("configured model '{name}' is not installed"),
            found_models: found,
        };
    }

    match found.first().cloned() {
        Some(first) => LlmReadiness {
            ok: true,
            detail: format!("using model '{first}'"),
            found_models: found,
        },
        None => LlmReadiness {
            ok: false,
            detail: format!(
                "no supported model found — pull one of: {}",
                known.join(", ")
            ),
            found_models: Vec::new(),
        },
    }
}

/// Check that every required asset file exists (and is non-empty) under
/// `models_dir`.
pub fn check_assets(specs: &[AssetSpec], models_dir: &Path) -> AssetReadiness {
    let files: BTreeMap<String, bool> = specs
        .iter()
        .map(|spec| (spec.name.clone(), is_present(&spec.local_path(models_dir))))
        .collect();
    let ok = files.values().all(|&present| present);
    AssetReadiness { ok, files }
}

/// Run both checks and combine them.
pub async fn check_all(
    registry: &dyn ModelRegistry,
    known: &[String],
    override_name: Option<&str>,
    specs: &[AssetSpec],
    models_dir: &Path,
) -> ReadinessReport {
    let llm = check_llm(registry, known, override_name).await;
    let assets = check_assets(specs, models_dir);
    ReadinessReport {
        ok: llm.ok && assets.ok,
        llm,
        assets,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
