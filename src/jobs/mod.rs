//! Job orchestration: per-job state, stage sequencing, and run lifecycle.
//!
//! # Architecture
//!
//! ```text
//! extract(input)          refine(job_id)           synthesize(job_id)
//!      │                        │                         │
//!      ▼                        ▼                         ▼
//! ┌─────────────────────── Orchestrator ────────────────────────────┐
//! │  JobRegistry: id → JobRecord {dir, doc_name, stage}             │
//! │               id → run gate (at most one active run per job)    │
//! │                                                                 │
//! │  per run: gate → stage check → chunk loop → artifact → advance  │
//! │           progress streamed through an EventSink per run        │
//! └─────────────────────────────────────────────────────────────────┘
//!      │                        │                         │
//!   DocumentExtractor       TextRefiner            SpeechSynthesizer
//! ```
//!
//! Stage pointers only move forward; failures and cancellations leave them
//! untouched so the same stage can be retried from scratch.

pub mod registry;
pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use registry::{JobRecord, JobRegistry, JobStage, RunGuard, StageConflict};
pub use runner::{Orchestrator, RunError, StageEngines};
