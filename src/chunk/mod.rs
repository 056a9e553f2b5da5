//! Text chunking and audio reassembly.
//!
//! The two pipeline stages that call an external collaborator per piece
//! need their input cut into bounded pieces first:
//!
//! * [`split_for_refinement`] — character-budget chunks for the language
//!   model; an exact partition of the input (concatenation reconstructs it).
//! * [`split_sentences`] — sentence-level units for the synthesis runtime;
//!   short sentences merge with neighbours, no unit ends mid-sentence.
//! * [`stitch`] / [`write_wav`] — reassemble the per-chunk audio buffers in
//!   order and write one continuous WAV file.

pub mod refine;
pub mod sentence;
pub mod stitch;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use refine::split_for_refinement;
pub use sentence::{ensure_sentence_end, split_sentences};
pub use stitch::{stitch, write_wav, AudioChunk, StitchError};
