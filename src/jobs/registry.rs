//! Job records, the stage pointer, and the per-job run gate.
//!
//! A job is one document's conversion record: an opaque id, an owning
//! directory, and a stage pointer that only ever moves forward through
//! `None → Extracted → Refined → Synthesized`.  The registry also owns the
//! active-run set that enforces at most one running stage per job id.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

// ---------------------------------------------------------------------------
// JobStage
// ---------------------------------------------------------------------------

/// How far a job has progressed.  Ordered: later stages compare greater.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobStage {
    /// Created but nothing extracted yet.
    #[default]
    None,
    /// The extraction artifact exists.
    Extracted,
    /// The refinement artifact exists.
    Refined,
    /// The final audio artifact exists.
    Synthesized,
}

impl JobStage {
    /// Short label for logs and the status endpoint.
    pub fn label(&self) -> &'static str {
        match self {
            JobStage::None => "none",
            JobStage::Extracted => "extracted",
            JobStage::Refined => "refined",
            JobStage::Synthesized => "synthesized",
        }
    }
}

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// One job's directory, document name and current stage.
///
/// Artifacts are named predictably after the job directory's name so a
/// caller can locate output without querying the service:
/// `<doc>_extracted.md`, `<doc>_refined.txt`, `<doc>_audio.wav`.
#[derive(Debug, Clone)]
pub struct JobRecord {
    /// Directory all of this job's artifacts live in.
    pub dir: PathBuf,
    /// Document name used in artifact file names (the directory's name).
    pub doc_name: String,
    /// Current stage pointer.
    pub stage: JobStage,
}

impl JobRecord {
    pub fn new(dir: PathBuf) -> Self {
        let doc_name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Self {
            dir,
            doc_name,
            stage: JobStage::None,
        }
    }

    /// Path of the extraction artifact.
    pub fn extracted_path(&self) -> PathBuf {
        self.dir.join(format!("{}_extracted.md", self.doc_name))
    }

    /// Path of the refinement artifact.
    pub fn refined_path(&self) -> PathBuf {
        self.dir.join(format!("{}_refined.txt", self.doc_name))
    }

    /// Path of the final audio artifact.
    pub fn audio_path(&self) -> PathBuf {
        self.dir.join(format!("{}_audio.wav", self.doc_name))
    }

    /// Infer the stage from which artifacts exist on disk.  Used when a
    /// caller presents a job id this process has never seen (artifacts
    /// survive restarts even though job state does not).
    pub fn stage_on_disk(&self) -> JobStage {
        if self.audio_path().exists() {
            JobStage::Synthesized
        } else if self.refined_path().exists() {
            JobStage::Refined
        } else if self.extracted_path().exists() {
            JobStage::Extracted
        } else {
            JobStage::None
        }
    }
}

// ---------------------------------------------------------------------------
// StageConflict
// ---------------------------------------------------------------------------

/// A run was requested while another run is active for the same job.
#[derive(Debug, Clone, Error)]
#[error("another run is already active for job '{job_id}'")]
pub struct StageConflict {
    pub job_id: String,
}

// ---------------------------------------------------------------------------
// JobRegistry
// ---------------------------------------------------------------------------

/// In-memory job table plus the per-job mutual-exclusion gate.
///
/// Jobs live for the process lifetime; cleanup of their directories is an
/// external concern.  All locks guard short critical sections and are
/// never held across `.await` points.
pub struct JobRegistry {
    output_base: PathBuf,
    jobs: Mutex<HashMap<String, JobRecord>>,
    active: Mutex<HashSet<String>>,
}

impl JobRegistry {
    pub fn new(output_base: PathBuf) -> Self {
        Self {
            output_base,
            jobs: Mutex::new(HashMap::new()),
            active: Mutex::new(HashSet::new()),
        }
    }

    pub fn output_base(&self) -> &Path {
        &self.output_base
    }

    /// Mint a new job for `doc_stem`, housed in `out_dir` when the caller
    /// chose one and under the default output base otherwise.
    pub fn create(&self, doc_stem: &str, out_dir: Option<PathBuf>) -> (String, JobRecord) {
        let job_id = uuid::Uuid::new_v4().to_string();
        let dir = out_dir.unwrap_or_else(|| self.output_base.join(doc_stem));
        let record = JobRecord::new(dir);
        self.jobs
            .lock()
            .unwrap()
            .insert(job_id.clone(), record.clone());
        (job_id, record)
    }

    /// Look up `job_id`, adopting it from disk when this process has never
    /// seen it: unknown ids map to `<output_base>/<job_id>` and take their
    /// stage from the artifacts present there.
    pub fn resolve(&self, job_id: &str) -> JobRecord {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.entry(job_id.to_string())
            .or_insert_with(|| {
                let mut record = JobRecord::new(self.output_base.join(job_id));
                record.stage = record.stage_on_disk();
                record
            })
            .clone()
    }

    /// Advance `job_id`'s stage pointer.  Monotonic: a stage can never move
    /// backwards, so retrying an already-passed stage is harmless.
    pub fn advance(&self, job_id: &str, stage: JobStage) {
        if let Some(record) = self.jobs.lock().unwrap().get_mut(job_id) {
            record.stage = record.stage.max(stage);
        }
    }

    /// Current stage of a known job.
    pub fn stage(&self, job_id: &str) -> Option<JobStage> {
        self.jobs.lock().unwrap().get(job_id).map(|r| r.stage)
    }

    /// Claim the run gate for `job_id`.  The returned guard releases it on
    /// every exit path — success, failure or cancellation — via `Drop`.
    pub fn begin_run(self: &Arc<Self>, job_id: &str) -> Result<RunGuard, StageConflict> {
        let mut active = self.active.lock().unwrap();
        if !active.insert(job_id.to_string()) {
            return Err(StageConflict {
                job_id: job_id.to_string(),
            });
        }
        Ok(RunGuard {
            registry: Arc::clone(self),
            job_id: job_id.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// RunGuard
// ---------------------------------------------------------------------------

/// RAII token for one active run; dropping it reopens the job's gate.
pub struct RunGuard {
    registry: Arc<JobRegistry>,
    job_id: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry.active.lock().unwrap().remove(&self.job_id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
