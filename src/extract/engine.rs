//! Core `DocumentExtractor` trait and the plain-text implementation.
//!
//! # Overview
//!
//! [`DocumentExtractor`] is the boundary to the text-extraction collaborator.
//! It is object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn DocumentExtractor>`.
//!
//! [`PlainTextExtractor`] is the shipped implementation: it handles plain
//! text and Markdown documents directly.  Rich formats (PDF, EPUB, …) are
//! expected to be converted by an external tool in front of the service and
//! fail with [`ExtractError::UnsupportedFormat`].
//!
//! [`MockExtractor`] (available under `#[cfg(test)]`) returns a
//! pre-configured response — useful for unit-testing the orchestrator
//! without touching the filesystem format checks.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ExtractError
// ---------------------------------------------------------------------------

/// All errors that can arise from the extraction boundary.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The input document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The document's format is not handled by this extractor.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The document exists but is not valid UTF-8 text.
    #[error("document is not valid UTF-8 text: {0}")]
    Encoding(String),

    /// Reading the document failed.
    #[error("failed to read document: {0}")]
    Io(String),
}

// ---------------------------------------------------------------------------
// DocumentExtractor trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for document text extraction.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extract the full text content of the document at `input`.
    async fn extract(&self, input: &Path) -> Result<String, ExtractError>;
}

// Compile-time assertion: Box<dyn DocumentExtractor> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn DocumentExtractor>) {}
};

// ---------------------------------------------------------------------------
// PlainTextExtractor
// ---------------------------------------------------------------------------

/// File extensions read directly as text.
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Extractor for documents that already are text.
#[derive(Debug, Default, Clone)]
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract(&self, input: &Path) -> Result<String, ExtractError> {
        if !input.exists() {
            return Err(ExtractError::NotFound(input.display().to_string()));
        }

        let extension = input
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ExtractError::UnsupportedFormat(format!(
                "{} (supported: {})",
                input.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let bytes = tokio::fs::read(input)
            .await
            .map_err(|e| ExtractError::Io(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ExtractError::Encoding(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockExtractor  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response without reading any
/// document.
#[cfg(test)]
pub struct MockExtractor {
    response: Result<String, ExtractError>,
}

#[cfg(test)]
impl MockExtractor {
    /// Mock that always succeeds with `text`.
    pub fn ok(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
        }
    }

    /// Mock that always fails with `error`.
    pub fn err(error: ExtractError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl DocumentExtractor for MockExtractor {
    async fn extract(&self, _input: &Path) -> Result<String, ExtractError> {
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
