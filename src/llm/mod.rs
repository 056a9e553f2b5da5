//! Language-model boundary: text refinement and the model registry.
//!
//! This module provides:
//! * [`TextRefiner`] — async trait implemented by refinement backends.
//! * [`OllamaRefiner`] — OpenAI-compatible REST refiner (shipped backend).
//! * [`ModelRegistry`] / [`OllamaRegistry`] — installed-model listing.
//! * [`pick_model`] / [`matching_models`] — supported-model selection,
//!   shared by the refiner and the readiness checker.
//! * [`LlmError`] — error variants for LLM operations.

pub mod refiner;
pub mod registry;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use refiner::{LlmError, OllamaRefiner, TextRefiner};
pub use registry::{matching_models, pick_model, ModelRegistry, OllamaRegistry};

// test-only re-exports so other modules' test code can use the doubles
// without reaching into submodule paths.
#[cfg(test)]
pub use refiner::MockRefiner;
#[cfg(test)]
pub use registry::MockRegistry;
