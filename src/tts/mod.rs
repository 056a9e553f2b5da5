//! Speech-synthesis boundary.
//!
//! * [`SpeechSynthesizer`] — async trait implemented by synthesis backends.
//! * [`KokoroClient`] — shipped backend talking to a local Kokoro server.
//! * [`decode_wav`] — WAV byte buffer → raw mono samples.
//! * [`TtsError`] — error variants for synthesis operations.

pub mod engine;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use engine::{decode_wav, KokoroClient, SpeechSynthesizer, TtsError};

#[cfg(test)]
pub use engine::MockSynthesizer;
