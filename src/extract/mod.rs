//! Document text extraction boundary.
//!
//! * [`DocumentExtractor`] — async trait implemented by extraction backends.
//! * [`PlainTextExtractor`] — shipped backend for text/Markdown documents.
//! * [`ExtractError`] — error variants for extraction operations.

pub mod engine;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use engine::{DocumentExtractor, ExtractError, PlainTextExtractor};

#[cfg(test)]
pub use engine::MockExtractor;
