//! Producer/consumer halves of the progress stream, plus the wire framing.
//!
//! A stage run (producer) holds an [`EventSink`]; the transport task drains
//! the paired receiver and writes one newline-terminated JSON record per
//! event.  A consumer on the other side of the transport feeds raw byte
//! fragments into a [`FrameDecoder`] and gets complete events back — the
//! decoder tolerates any fragmentation the transport introduces.
//!
//! # Cancellation
//!
//! The sink's channel doubles as the cancellation signal: when the observer
//! tears the stream down, the receiver is dropped and
//! [`EventSink::is_cancelled`] flips to `true`.  Runs poll it at chunk
//! boundaries, so cancellation latency is bounded by one chunk of work.
//!
//! # Close semantics
//!
//! [`EventSink::finish`] and [`EventSink::fail`] take the sink by value, so
//! emitting after the terminal event — or closing twice — is a compile
//! error rather than a runtime hazard.

use thiserror::Error;
use tokio::sync::mpsc;

use super::event::{ProgressEvent, RunSummary};

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Single-writer producer handle for one in-flight run.
///
/// Emitting never blocks: the channel is unbounded, and events pushed after
/// the observer disconnected are silently dropped (the run discovers the
/// disconnect through [`is_cancelled`](Self::is_cancelled) at its next
/// chunk boundary).
#[derive(Debug)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl EventSink {
    /// Create a sink and the receiver the transport drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit one event.  A disconnected receiver makes this a no-op.
    pub fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }

    /// Emit a plain progress message.
    pub fn progress(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::progress(message));
    }

    /// Emit a counted progress message.
    pub fn progress_count(&self, message: impl Into<String>, completed: u64, total: Option<u64>) {
        self.emit(ProgressEvent::progress_count(message, completed, total));
    }

    /// Emit a milestone event.
    pub fn milestone(&self, name: impl Into<String>) {
        self.emit(ProgressEvent::Milestone { name: name.into() });
    }

    /// `true` once the observer has torn down its end of the stream.
    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }

    /// Terminate the stream with a `done` event.
    pub fn finish(self, result: RunSummary) {
        self.emit(ProgressEvent::Done { result });
    }

    /// Terminate the stream with an `error` event.
    pub fn fail(self, category: &str, message: impl Into<String>) {
        self.emit(ProgressEvent::Error {
            category: category.to_string(),
            message: message.into(),
        });
    }
}

// ---------------------------------------------------------------------------
// Wire framing
// ---------------------------------------------------------------------------

/// Encode one event as a newline-terminated JSON frame.
pub fn encode_frame(event: &ProgressEvent) -> String {
    // ProgressEvent contains only strings and integers; serialisation is
    // infallible.
    let mut line = serde_json::to_string(event).expect("progress event serialises to JSON");
    line.push('\n');
    line
}

/// A frame could not be parsed back into a [`ProgressEvent`].
#[derive(Debug, Error)]
#[error("malformed progress frame: {0}")]
pub struct FrameError(#[from] serde_json::Error);

/// Incremental decoder for the newline-delimited frame stream.
///
/// Feed it transport fragments of any size; it yields an event for every
/// complete line and keeps only the unconsumed remainder buffered, however
/// large a single frame grows or however finely it is fragmented.
///
/// ```
/// use doctalk::progress::{FrameDecoder, ProgressEvent};
///
/// let mut dec = FrameDecoder::new();
/// assert!(dec.feed(br#"{"type":"milestone","#).unwrap().is_empty());
/// let events = dec.feed(b"\"name\":\"voices-v1.0.bin\"}\n").unwrap();
/// assert_eq!(events, vec![ProgressEvent::Milestone { name: "voices-v1.0.bin".into() }]);
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transport fragment and drain every complete frame from the
    /// internal buffer.
    pub fn feed(&mut self, fragment: &[u8]) -> Result<Vec<ProgressEvent>, FrameError> {
        self.buf.extend_from_slice(fragment);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            // Drain through the delimiter so the buffer shrinks to the
            // unconsumed remainder on every pass.
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            events.push(serde_json::from_slice(line)?);
        }
        Ok(events)
    }

    /// Bytes of the incomplete trailing frame still buffered.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
