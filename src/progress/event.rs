//! Progress event types for the streamed status protocol.
//!
//! Every mutating operation (stage run, asset download) pushes an ordered
//! sequence of [`ProgressEvent`]s to its observer.  The final event of a
//! successful run is always [`ProgressEvent::Done`]; the final event of a
//! failed run is always [`ProgressEvent::Error`].  A cancelled run ends
//! without a terminal event — the observer that would receive it is gone.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProgressEvent
// ---------------------------------------------------------------------------

/// One unit of the streamed status protocol.
///
/// Serialised with an external `type` tag so consumers can dispatch on a
/// single field:
///
/// ```json
/// {"type":"progress","message":"Refined chunk 2/7","completed":2,"total":7}
/// {"type":"milestone","name":"kokoro-v1.0.onnx"}
/// {"type":"done","result":{"job_id":"…","stage":"refine"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Free-form status update.  `completed`/`total` carry chunk counts for
    /// stage runs and byte counts for downloads; `total` is omitted when the
    /// producer does not know it (never fabricated).
    Progress {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completed: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
    },

    /// A named sub-goal completed (e.g. one asset file fully downloaded).
    Milestone { name: String },

    /// Terminal failure.  `category` is the machine-readable error class
    /// (`input_error`, `dependency_unavailable`, `stage_conflict`,
    /// `transient_io_error`); `message` is human-readable detail.
    Error { category: String, message: String },

    /// Terminal success.
    Done { result: RunSummary },
}

impl ProgressEvent {
    /// Build a plain progress message with no counts.
    pub fn progress(message: impl Into<String>) -> Self {
        ProgressEvent::Progress {
            message: message.into(),
            completed: None,
            total: None,
        }
    }

    /// Build a counted progress message (`completed` out of optional `total`).
    pub fn progress_count(message: impl Into<String>, completed: u64, total: Option<u64>) -> Self {
        ProgressEvent::Progress {
            message: message.into(),
            completed: Some(completed),
            total,
        }
    }

    /// `true` for [`ProgressEvent::Done`] and [`ProgressEvent::Error`] —
    /// the two events that may legally end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Done { .. } | ProgressEvent::Error { .. })
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Payload of a terminal [`ProgressEvent::Done`] event.
///
/// All fields are optional; each operation fills in what it produced.  A
/// stage run reports the job it advanced and the artifact it wrote; the
/// asset downloader reports only a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifier of the job this run belongs to.  Present on every stage
    /// run; the extract stage is where the caller first learns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,

    /// Stage name: `"extract"`, `"refine"` or `"synthesize"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Path of the artifact the run wrote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,

    /// Character count of a text artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_count: Option<u64>,

    /// Free-form completion message (used by the asset downloader).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunSummary {
    /// Summary for a completed stage run.
    pub fn stage(job_id: impl Into<String>, stage: &str, output_file: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
            stage: Some(stage.to_string()),
            output_file: Some(output_file.into()),
            ..Self::default()
        }
    }

    /// Summary carrying only a completion message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Attach a character count to a text-artifact summary.
    pub fn with_chars(mut self, chars: u64) -> Self {
        self.char_count = Some(chars);
        self
    }
}

// ---------------------------------------------------------------------------
// RunOutcome
// ---------------------------------------------------------------------------

/// Terminal state of one streamed run, as seen by the task that drove it.
///
/// Mirrors the terminal event on the wire: `Completed` pairs with a `done`
/// event, `Failed` with an `error` event, and `Cancelled` with a stream
/// that was torn down by the observer before the run finished.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunSummary),
    Failed { category: String, message: String },
    Cancelled,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
