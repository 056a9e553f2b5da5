//! Stage runners — one invocation of extract, refine or synthesize
//! against a job.
//!
//! # Run lifecycle
//!
//! ```text
//! run_refine(job_id, sink)
//!   ├─ begin_run(job_id)            → StageConflict when already running
//!   ├─ stage gate                   → Input error when out of order
//!   ├─ per-chunk loop
//!   │    ├─ sink.is_cancelled()?    → Cancelled (stage pointer untouched)
//!   │    ├─ collaborator call       → error ends the run (stage untouched)
//!   │    └─ progress completed/total
//!   ├─ write artifact, advance stage
//!   └─ terminal done / error event  (guard released on every path)
//! ```
//!
//! Every failure inside a run is caught at the run boundary and converted
//! into a terminal `error` event — a collaborator blowing up never takes
//! the service down, and the job's stage pointer is left unchanged so the
//! same stage can simply be retried.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::chunk::{
    ensure_sentence_end, split_for_refinement, split_sentences, stitch, write_wav, StitchError,
};
use crate::config::AppConfig;
use crate::extract::{DocumentExtractor, ExtractError};
use crate::llm::{LlmError, TextRefiner};
use crate::progress::{EventSink, RunOutcome, RunSummary};
use crate::tts::{SpeechSynthesizer, TtsError};

use super::registry::{JobRegistry, JobStage, StageConflict};

// ---------------------------------------------------------------------------
// RunError
// ---------------------------------------------------------------------------

/// Why a stage run ended without completing.
///
/// Variants map one-to-one onto the machine-readable categories carried by
/// terminal `error` events; [`category`](Self::category) is that mapping.
#[derive(Debug, Error)]
pub enum RunError {
    /// Bad input: missing document, stage requested out of order, nothing
    /// to process.  Not retryable as-is.
    #[error("{0}")]
    Input(String),

    /// An external dependency is unusable: runtime unreachable, model not
    /// installed.  The caller remediates and re-checks readiness.
    #[error("{0}")]
    Dependency(String),

    /// Another run is active for this job id.
    #[error(transparent)]
    Conflict(#[from] StageConflict),

    /// A collaborator or I/O call failed mid-run.  Retrying the whole
    /// stage is the caller's call; the core never retries.
    #[error("{0}")]
    Transient(String),

    /// The observer tore down the progress stream.
    #[error("run cancelled by the observer")]
    Cancelled,
}

impl RunError {
    /// Machine-readable category for the terminal `error` event.
    pub fn category(&self) -> &'static str {
        match self {
            RunError::Input(_) => "input_error",
            RunError::Dependency(_) => "dependency_unavailable",
            RunError::Conflict(_) => "stage_conflict",
            RunError::Transient(_) => "transient_io_error",
            RunError::Cancelled => "cancelled",
        }
    }
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        RunError::Transient(e.to_string())
    }
}

impl From<ExtractError> for RunError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::NotFound(_)
            | ExtractError::UnsupportedFormat(_)
            | ExtractError::Encoding(_) => RunError::Input(e.to_string()),
            ExtractError::Io(_) => RunError::Transient(e.to_string()),
        }
    }
}

impl From<LlmError> for RunError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Request(_)
            | LlmError::OverrideNotInstalled(_)
            | LlmError::NoSupportedModel(_) => RunError::Dependency(e.to_string()),
            LlmError::Timeout | LlmError::Parse(_) | LlmError::EmptyResponse => {
                RunError::Transient(e.to_string())
            }
        }
    }
}

impl From<TtsError> for RunError {
    fn from(e: TtsError) -> Self {
        match e {
            TtsError::Request(_) => RunError::Dependency(e.to_string()),
            TtsError::Timeout
            | TtsError::Http { .. }
            | TtsError::Decode(_)
            | TtsError::EmptyAudio => RunError::Transient(e.to_string()),
        }
    }
}

impl From<StitchError> for RunError {
    fn from(e: StitchError) -> Self {
        match e {
            StitchError::Empty => RunError::Input("no audio generated — text may be empty".into()),
            StitchError::SampleRateMismatch { .. } => RunError::Dependency(e.to_string()),
            StitchError::Wav(_) => RunError::Transient(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// StageEngines
// ---------------------------------------------------------------------------

/// The three external collaborators, shared across every run.
#[derive(Clone)]
pub struct StageEngines {
    pub extractor: Arc<dyn DocumentExtractor>,
    pub refiner: Arc<dyn TextRefiner>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives jobs through the three conversion stages.
///
/// One orchestrator serves all jobs concurrently; each run executes on its
/// caller's task while its progress channel is drained independently, and
/// the per-job run gate keeps stage invocations for one job serial.
pub struct Orchestrator {
    registry: Arc<JobRegistry>,
    engines: StageEngines,
    config: AppConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<JobRegistry>, engines: StageEngines, config: AppConfig) -> Self {
        Self {
            registry,
            engines,
            config,
        }
    }

    /// Shared handle to the job table.
    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    // -----------------------------------------------------------------------
    // Stage 1 — extract
    // -----------------------------------------------------------------------

    /// Extract `input`'s text, minting a new job.
    ///
    /// The terminal `done` event carries the new job id.  No run gate is
    /// needed here — the job id does not exist until this run succeeds, so
    /// distinct extract runs can never collide.
    pub async fn run_extract(
        &self,
        input: &Path,
        out_dir: Option<PathBuf>,
        sink: EventSink,
    ) -> RunOutcome {
        let result = self.extract_inner(input, out_dir, &sink).await;
        finish_run("extract", sink, result)
    }

    async fn extract_inner(
        &self,
        input: &Path,
        out_dir: Option<PathBuf>,
        sink: &EventSink,
    ) -> Result<RunSummary, RunError> {
        let file_name = input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        sink.progress(format!("Extracting text from {file_name}..."));

        let text = self.engines.extractor.extract(input).await?;
        if sink.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        let doc_stem = input
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        let (job_id, record) = self.registry.create(doc_stem, out_dir);
        tokio::fs::create_dir_all(&record.dir).await?;

        sink.progress("Writing extracted text...");
        let out_path = record.extracted_path();
        tokio::fs::write(&out_path, &text).await?;
        self.registry.advance(&job_id, JobStage::Extracted);

        let chars = text.chars().count() as u64;
        log::info!("job {job_id}: extracted {chars} chars from {}", input.display());
        Ok(RunSummary::stage(job_id, "extract", out_path.display().to_string()).with_chars(chars))
    }

    // -----------------------------------------------------------------------
    // Stage 2 — refine
    // -----------------------------------------------------------------------

    /// Clean the extracted text with the language model, chunk by chunk.
    pub async fn run_refine(&self, job_id: &str, sink: EventSink) -> RunOutcome {
        let result = self.refine_inner(job_id, &sink).await;
        finish_run("refine", sink, result)
    }

    async fn refine_inner(&self, job_id: &str, sink: &EventSink) -> Result<RunSummary, RunError> {
        let _guard = self.registry.begin_run(job_id)?;
        let record = self.registry.resolve(job_id);

        let in_path = record.extracted_path();
        if record.stage < JobStage::Extracted || !in_path.exists() {
            return Err(RunError::Input(format!(
                "job '{job_id}' has no extracted text — run the extract stage first"
            )));
        }

        let raw = tokio::fs::read_to_string(&in_path).await?;
        let chunks = split_for_refinement(&raw, self.config.refine.chunk_chars);
        let total = chunks.len() as u64;
        sink.progress_count(format!("Refining {total} chunks..."), 0, Some(total));

        let mut cleaned = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            if sink.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            cleaned.push(self.engines.refiner.refine(chunk).await?);
            let done = idx as u64 + 1;
            sink.progress_count(format!("Refined chunk {done}/{total}"), done, Some(total));
        }

        if sink.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        sink.progress("Writing refined text...");
        let refined = cleaned.join(" ");
        let out_path = record.refined_path();
        tokio::fs::write(&out_path, &refined).await?;
        self.registry.advance(job_id, JobStage::Refined);

        log::info!("job {job_id}: refined {total} chunks");
        Ok(
            RunSummary::stage(job_id, "refine", out_path.display().to_string())
                .with_chars(refined.chars().count() as u64),
        )
    }

    // -----------------------------------------------------------------------
    // Stage 3 — synthesize
    // -----------------------------------------------------------------------

    /// Render the refined text to one WAV file, sentence unit by unit.
    pub async fn run_synthesize(&self, job_id: &str, sink: EventSink) -> RunOutcome {
        let result = self.synthesize_inner(job_id, &sink).await;
        finish_run("synthesize", sink, result)
    }

    async fn synthesize_inner(
        &self,
        job_id: &str,
        sink: &EventSink,
    ) -> Result<RunSummary, RunError> {
        let _guard = self.registry.begin_run(job_id)?;
        let record = self.registry.resolve(job_id);

        let in_path = record.refined_path();
        if record.stage < JobStage::Refined || !in_path.exists() {
            return Err(RunError::Input(format!(
                "job '{job_id}' has no refined text — run the refine stage first"
            )));
        }

        let text = tokio::fs::read_to_string(&in_path).await?;
        let units = split_sentences(&text, self.config.tts.max_chunk_chars);
        if units.is_empty() {
            return Err(RunError::Input(
                "no text to synthesize — the refined text is empty".into(),
            ));
        }

        let total = units.len() as u64;
        sink.progress_count(
            format!("Generating audio for {total} chunks..."),
            0,
            Some(total),
        );

        let mut rendered = Vec::with_capacity(units.len());
        for (idx, unit) in units.iter().enumerate() {
            if sink.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            let spoken = ensure_sentence_end(unit);
            rendered.push(
                self.engines
                    .synthesizer
                    .synthesize(&spoken, &self.config.tts.voice)
                    .await?,
            );
            let done = idx as u64 + 1;
            sink.progress_count(format!("Chunk {done}/{total}"), done, Some(total));
        }

        if sink.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        sink.progress("Writing audio file...");
        let audio = stitch(rendered)?;
        let out_path = record.audio_path();

        // The WAV encoder is synchronous; keep it off the async workers.
        let write_path = out_path.clone();
        tokio::task::spawn_blocking(move || write_wav(&write_path, &audio))
            .await
            .map_err(|e| RunError::Transient(e.to_string()))??;
        self.registry.advance(job_id, JobStage::Synthesized);

        log::info!("job {job_id}: synthesized {total} chunks into {}", out_path.display());
        Ok(RunSummary::stage(job_id, "synthesize", out_path.display().to_string()))
    }
}

// ---------------------------------------------------------------------------
// Run boundary
// ---------------------------------------------------------------------------

/// Convert a run's result into its terminal event and [`RunOutcome`].
///
/// Cancellation emits nothing — the observer that would receive a terminal
/// event is gone — and the job's stage pointer was left untouched by the
/// inner function on every non-success path.
fn finish_run(stage: &str, sink: EventSink, result: Result<RunSummary, RunError>) -> RunOutcome {
    match result {
        Ok(summary) => {
            sink.finish(summary.clone());
            RunOutcome::Completed(summary)
        }
        Err(RunError::Cancelled) => {
            log::info!("{stage} run cancelled by the observer");
            RunOutcome::Cancelled
        }
        Err(e) => {
            let category = e.category();
            let message = e.to_string();
            log::error!("{stage} run failed ({category}): {message}");
            sink.fail(category, message.as_str());
            RunOutcome::Failed {
                category: category.to_string(),
                message,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PlainTextExtractor;
    use crate::llm::MockRefiner;
    use crate::progress::ProgressEvent;
    use crate::tts::MockSynthesizer;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn engines(refiner: MockRefiner, synthesizer: MockSynthesizer) -> StageEngines {
        StageEngines {
            extractor: Arc::new(PlainTextExtractor),
            refiner: Arc::new(refiner),
            synthesizer: Arc::new(synthesizer),
        }
    }

    /// Orchestrator over a temp output base, with chunk budgets small
    /// enough that the fixture text spans several chunks.
    fn make_orchestrator(base: &TempDir, engines: StageEngines) -> Arc<Orchestrator> {
        let mut config = AppConfig::default();
        config.refine.chunk_chars = 40;
        config.tts.max_chunk_chars = 60;
        let registry = Arc::new(JobRegistry::new(base.path().to_path_buf()));
        Arc::new(Orchestrator::new(registry, engines, config))
    }

    const FIXTURE_TEXT: &str = "The first sentence sets the scene. A second sentence builds on it. \
         The third sentence keeps the story moving along. A fourth wraps the chapter up.";

    /// Write the fixture document and run extract, returning the job id.
    async fn extract_fixture(orch: &Orchestrator, dir: &TempDir) -> String {
        let source = dir.path().join("book.txt");
        std::fs::write(&source, FIXTURE_TEXT).unwrap();

        let (sink, _rx) = EventSink::channel();
        match orch.run_extract(&source, None, sink).await {
            RunOutcome::Completed(summary) => summary.job_id.expect("job id in done event"),
            other => panic!("extract did not complete: {other:?}"),
        }
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    // -----------------------------------------------------------------------
    // End-to-end
    // -----------------------------------------------------------------------

    /// extract → refine → synthesize on a short document produces a real,
    /// non-empty audio artifact at the reported path.
    #[tokio::test]
    async fn full_pipeline_produces_an_audio_artifact() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(&dir, engines(MockRefiner::ok(), MockSynthesizer::ok(1_000, 24_000)));

        let job_id = extract_fixture(&orch, &dir).await;
        assert_eq!(orch.registry().stage(&job_id), Some(JobStage::Extracted));

        let (sink, _rx) = EventSink::channel();
        assert!(orch.run_refine(&job_id, sink).await.is_completed());
        assert_eq!(orch.registry().stage(&job_id), Some(JobStage::Refined));

        let (sink, _rx) = EventSink::channel();
        let outcome = orch.run_synthesize(&job_id, sink).await;
        let summary = match outcome {
            RunOutcome::Completed(summary) => summary,
            other => panic!("synthesize did not complete: {other:?}"),
        };
        assert_eq!(orch.registry().stage(&job_id), Some(JobStage::Synthesized));

        let wav_path = PathBuf::from(summary.output_file.expect("artifact path"));
        assert!(wav_path.exists());
        let reader = hound::WavReader::open(&wav_path).expect("readable WAV");
        assert!(reader.duration() > 0);
    }

    /// The refine run streams `completed/total` counts in order and ends
    /// with a `done` event carrying the job id.
    #[tokio::test]
    async fn refine_streams_ordered_chunk_progress() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(&dir, engines(MockRefiner::ok(), MockSynthesizer::ok(10, 24_000)));
        let job_id = extract_fixture(&orch, &dir).await;

        let (sink, mut rx) = EventSink::channel();
        assert!(orch.run_refine(&job_id, sink).await.is_completed());

        let events = drain(&mut rx);
        let counts: Vec<u64> = events
            .iter()
            .filter_map(|ev| match ev {
                ProgressEvent::Progress {
                    completed: Some(c), ..
                } => Some(*c),
                _ => None,
            })
            .collect();
        assert!(counts.len() >= 3, "fixture should span several chunks");
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));

        match events.last() {
            Some(ProgressEvent::Done { result }) => {
                assert_eq!(result.job_id.as_deref(), Some(job_id.as_str()));
                assert_eq!(result.stage.as_deref(), Some("refine"));
            }
            other => panic!("expected terminal done event, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Ordering and conflicts
    // -----------------------------------------------------------------------

    /// An unreadable document fails the extract run as an input error and
    /// mints no job.
    #[tokio::test]
    async fn extractor_failure_is_an_input_error() {
        use crate::extract::{ExtractError, MockExtractor};

        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(
            &dir,
            StageEngines {
                extractor: Arc::new(MockExtractor::err(ExtractError::UnsupportedFormat(
                    "book.epub".into(),
                ))),
                refiner: Arc::new(MockRefiner::ok()),
                synthesizer: Arc::new(MockSynthesizer::ok(10, 24_000)),
            },
        );

        let (sink, mut rx) = EventSink::channel();
        let outcome = orch
            .run_extract(Path::new("book.epub"), None, sink)
            .await;

        match outcome {
            RunOutcome::Failed { category, message } => {
                assert_eq!(category, "input_error");
                assert!(message.contains("book.epub"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(
            drain(&mut rx).last(),
            Some(ProgressEvent::Error { .. })
        ));
    }

    /// Refining a job that was never extracted is rejected as input error.
    #[tokio::test]
    async fn refine_before_extract_is_an_input_error() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(&dir, engines(MockRefiner::ok(), MockSynthesizer::ok(10, 24_000)));

        let (sink, mut rx) = EventSink::channel();
        let outcome = orch.run_refine("no-such-job", sink).await;

        match outcome {
            RunOutcome::Failed { category, .. } => assert_eq!(category, "input_error"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(
            drain(&mut rx).last(),
            Some(ProgressEvent::Error { .. })
        ));
    }

    /// Synthesizing before refine is rejected the same way.
    #[tokio::test]
    async fn synthesize_before_refine_is_an_input_error() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(&dir, engines(MockRefiner::ok(), MockSynthesizer::ok(10, 24_000)));
        let job_id = extract_fixture(&orch, &dir).await;

        let (sink, _rx) = EventSink::channel();
        match orch.run_synthesize(&job_id, sink).await {
            RunOutcome::Failed { category, .. } => assert_eq!(category, "input_error"),
            other => panic!("expected failure, got {other:?}"),
        }
        // The stage pointer is untouched.
        assert_eq!(orch.registry().stage(&job_id), Some(JobStage::Extracted));
    }

    /// Two refine runs fired concurrently for one job: exactly one proceeds,
    /// the other is rejected with `stage_conflict`.
    #[tokio::test]
    async fn concurrent_refine_runs_conflict() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(
            &dir,
            engines(
                MockRefiner::slow(Duration::from_millis(30)),
                MockSynthesizer::ok(10, 24_000),
            ),
        );
        let job_id = extract_fixture(&orch, &dir).await;

        let (sink_a, _rx_a) = EventSink::channel();
        let (sink_b, _rx_b) = EventSink::channel();
        let (outcome_a, outcome_b) = tokio::join!(
            orch.run_refine(&job_id, sink_a),
            orch.run_refine(&job_id, sink_b)
        );

        let categories: Vec<_> = [&outcome_a, &outcome_b]
            .iter()
            .filter_map(|o| match o {
                RunOutcome::Failed { category, .. } => Some(category.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(categories, vec!["stage_conflict".to_string()]);
        assert_eq!(
            [&outcome_a, &outcome_b]
                .iter()
                .filter(|o| o.is_completed())
                .count(),
            1
        );
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    /// Aborting the stream mid-refine cancels the run at a chunk boundary,
    /// leaves the job at `Extracted`, and a retry then succeeds from scratch.
    #[tokio::test]
    async fn cancelled_refine_leaves_the_stage_retryable() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(
            &dir,
            engines(
                MockRefiner::slow(Duration::from_millis(30)),
                MockSynthesizer::ok(10, 24_000),
            ),
        );
        let job_id = extract_fixture(&orch, &dir).await;

        let (sink, mut rx) = EventSink::channel();
        let run = {
            let orch = Arc::clone(&orch);
            let job_id = job_id.clone();
            tokio::spawn(async move { orch.run_refine(&job_id, sink).await })
        };

        // Tear the stream down after the first progress event.
        let first = rx.recv().await.expect("first progress event");
        assert!(matches!(first, ProgressEvent::Progress { .. }));
        drop(rx);

        let outcome = run.await.expect("run task");
        assert!(outcome.is_cancelled());
        assert_eq!(orch.registry().stage(&job_id), Some(JobStage::Extracted));

        // A fresh attempt starts over and completes.
        let (sink, _rx) = EventSink::channel();
        assert!(orch.run_refine(&job_id, sink).await.is_completed());
        assert_eq!(orch.registry().stage(&job_id), Some(JobStage::Refined));
    }

    // -----------------------------------------------------------------------
    // Failure handling
    // -----------------------------------------------------------------------

    /// A collaborator failure ends the run with a terminal `error` event
    /// and leaves the stage pointer unchanged.
    #[tokio::test]
    async fn refiner_failure_preserves_the_stage() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(
            &dir,
            engines(MockRefiner::failing(), MockSynthesizer::ok(10, 24_000)),
        );
        let job_id = extract_fixture(&orch, &dir).await;

        let (sink, mut rx) = EventSink::channel();
        match orch.run_refine(&job_id, sink).await {
            RunOutcome::Failed { category, message } => {
                assert_eq!(category, "dependency_unavailable");
                assert!(message.contains("mock refinement failure"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(orch.registry().stage(&job_id), Some(JobStage::Extracted));
        assert!(!orch.registry().resolve(&job_id).refined_path().exists());
        assert!(matches!(
            drain(&mut rx).last(),
            Some(ProgressEvent::Error { .. })
        ));

        // The gate was released; the retry path is open.
        let (sink, _rx) = EventSink::channel();
        let retry = orch.run_refine(&job_id, sink).await;
        assert!(matches!(retry, RunOutcome::Failed { .. }));
    }

    /// A synthesis failure after refine keeps the job at `Refined`.
    #[tokio::test]
    async fn synthesizer_failure_preserves_the_stage() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(
            &dir,
            engines(MockRefiner::ok(), MockSynthesizer::failing()),
        );
        let job_id = extract_fixture(&orch, &dir).await;

        let (sink, _rx) = EventSink::channel();
        assert!(orch.run_refine(&job_id, sink).await.is_completed());

        let (sink, _rx) = EventSink::channel();
        match orch.run_synthesize(&job_id, sink).await {
            RunOutcome::Failed { category, .. } => assert_eq!(category, "dependency_unavailable"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(orch.registry().stage(&job_id), Some(JobStage::Refined));
        assert!(!orch.registry().resolve(&job_id).audio_path().exists());
    }

    /// Empty refined text fails synthesis as an input error instead of
    /// writing a zero-length WAV.
    #[tokio::test]
    async fn empty_refined_text_is_an_input_error() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(&dir, engines(MockRefiner::ok(), MockSynthesizer::ok(10, 24_000)));

        // Adopt a job whose refined artifact exists but is blank.
        let job_dir = dir.path().join("blank-job");
        std::fs::create_dir_all(&job_dir).unwrap();
        std::fs::write(job_dir.join("blank-job_refined.txt"), "   \n ").unwrap();

        let (sink, _rx) = EventSink::channel();
        match orch.run_synthesize("blank-job", sink).await {
            RunOutcome::Failed { category, message } => {
                assert_eq!(category, "input_error");
                assert!(message.contains("empty"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    /// Re-running an earlier stage never moves the pointer backwards.
    #[tokio::test]
    async fn stage_pointer_is_monotonic_across_retries() {
        let dir = tempdir().expect("temp dir");
        let orch = make_orchestrator(&dir, engines(MockRefiner::ok(), MockSynthesizer::ok(100, 24_000)));
        let job_id = extract_fixture(&orch, &dir).await;

        let (sink, _rx) = EventSink::channel();
        assert!(orch.run_refine(&job_id, sink).await.is_completed());
        let (sink, _rx) = EventSink::channel();
        assert!(orch.run_synthesize(&job_id, sink).await.is_completed());

        // Refine again after the job is fully synthesized.
        let (sink, _rx) = EventSink::channel();
        assert!(orch.run_refine(&job_id, sink).await.is_completed());
        assert_eq!(orch.registry().stage(&job_id), Some(JobStage::Synthesized));
    }
}
