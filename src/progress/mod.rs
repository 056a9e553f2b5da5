//! Streaming progress protocol.
//!
//! This module provides:
//! * [`ProgressEvent`] — the discriminated event record (progress /
//!   milestone / error / done).
//! * [`RunSummary`] — the payload of a terminal `done` event.
//! * [`RunOutcome`] — the run's terminal state as seen by its driving task.
//! * [`EventSink`] — single-writer producer handle, one per in-flight run;
//!   its channel disconnect doubles as the cancellation signal.
//! * [`encode_frame`] / [`FrameDecoder`] — newline-delimited JSON framing
//!   for carrying the event sequence over a byte transport.
//!
//! # Quick start
//!
//! ```
//! use doctalk::progress::{EventSink, FrameDecoder, RunSummary, encode_frame};
//!
//! let (sink, mut rx) = EventSink::channel();
//! sink.progress("working...");
//! sink.finish(RunSummary::message("all done"));
//!
//! // Transport side: frame each event, feed the bytes to a decoder.
//! let mut decoder = FrameDecoder::new();
//! while let Ok(event) = rx.try_recv() {
//!     let events = decoder.feed(encode_frame(&event).as_bytes()).unwrap();
//!     assert_eq!(events.len(), 1);
//! }
//! ```

pub mod event;
pub mod stream;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use event::{ProgressEvent, RunOutcome, RunSummary};
pub use stream::{encode_frame, EventSink, FrameDecoder, FrameError};
