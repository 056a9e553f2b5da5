//! Resumable, progress-reporting asset downloader.
//!
//! Missing asset files are fetched one at a time so progress events stay
//! unambiguous about which file they describe.  Each transfer streams into
//! a `<name>.part` temp file that is renamed into place on completion; a
//! failed transfer removes its temp file, emits a terminal `error` event
//! and aborts the remaining queue (a partial asset set is not useful).
//! Resumption is at file granularity: a retried file restarts from zero.

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::assets::catalog::{missing_assets, AssetSpec};
use crate::progress::{EventSink, RunOutcome, RunSummary};

// ---------------------------------------------------------------------------
// DownloadError
// ---------------------------------------------------------------------------

/// Errors that can occur while fetching asset files.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The transfer did not complete within the client's limits.
    #[error("download timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server returned HTTP {0}")]
    Http(u16),

    /// Writing the local file failed.
    #[error("failed to write file: {0}")]
    Io(String),

    /// The observer disconnected mid-transfer.
    #[error("download cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DownloadError::Timeout
        } else {
            DownloadError::Request(e.to_string())
        }
    }
}

impl DownloadError {
    fn category(&self) -> &'static str {
        match self {
            DownloadError::Cancelled => "cancelled",
            _ => "transient_io_error",
        }
    }
}

// ---------------------------------------------------------------------------
// FileFetcher trait
// ---------------------------------------------------------------------------

/// One file transfer, reporting byte progress through the run's sink.
///
/// Split out from the queue logic so fail-fast and cancellation behaviour
/// can be exercised without a network.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Fetch `spec.url` into `dest`, emitting byte-progress events.
    async fn fetch(&self, spec: &AssetSpec, dest: &Path, sink: &EventSink)
        -> Result<(), DownloadError>;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// Streaming HTTP transfer via `reqwest`.
///
/// No overall request timeout is set — model files are gigabytes on slow
/// links — only a connect timeout, so an unreachable host still fails
/// quickly.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileFetcher for HttpFetcher {
    async fn fetch(
        &self,
        spec: &AssetSpec,
        dest: &Path,
        sink: &EventSink,
    ) -> Result<(), DownloadError> {
        let response = self.client.get(&spec.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Http(status.as_u16()));
        }

        let total = response.content_length().filter(|&n| n > 0);
        let part = dest.with_file_name(format!("{}.part", spec.name));

        let streamed = stream_to_file(response, &part, spec, total, sink).await;
        match streamed {
            Ok(()) => tokio::fs::rename(&part, dest)
                .await
                .map_err(|e| DownloadError::Io(e.to_string())),
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}

async fn stream_to_file(
    response: reqwest::Response,
    part: &Path,
    spec: &AssetSpec,
    total: Option<u64>,
    sink: &EventSink,
) -> Result<(), DownloadError> {
    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| DownloadError::Io(e.to_string()))?;

    let mut stream = response.bytes_stream();
    let mut received: u64 = 0;
    let mut last_percent: Option<u64> = None;

    while let Some(chunk) = stream.next().await {
        if sink.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let chunk = chunk.map_err(DownloadError::from)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::Io(e.to_string()))?;
        received += chunk.len() as u64;

        match total {
            // Known size: throttle to whole-percent steps.
            Some(total_bytes) => {
                let percent = (received * 100 / total_bytes).min(100);
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    sink.progress_count(
                        format!("Downloading {}", spec.name),
                        received,
                        Some(total_bytes),
                    );
                }
            }
            // Unknown size: cumulative bytes only, no fabricated total.
            None => sink.progress_count(format!("Downloading {}", spec.name), received, None),
        }
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::Io(e.to_string()))
}

// ---------------------------------------------------------------------------
// Download queue
// ---------------------------------------------------------------------------

/// Fetch every missing asset, sequentially and fail-fast.
///
/// Emits per-file byte progress, a `milestone` as each file completes, and
/// a terminal `done`/`error` event.  Already-satisfied catalogs complete
/// immediately.
pub async fn download_missing(
    specs: &[AssetSpec],
    models_dir: &Path,
    fetcher: &dyn FileFetcher,
    sink: EventSink,
) -> RunOutcome {
    match download_inner(specs, models_dir, fetcher, &sink).await {
        Ok(message) => {
            log::info!("asset download complete: {message}");
            let summary = RunSummary::message(message);
            sink.finish(summary.clone());
            RunOutcome::Completed(summary)
        }
        Err(DownloadError::Cancelled) => {
            log::info!("asset download cancelled by the observer");
            RunOutcome::Cancelled
        }
        Err(e) => {
            let (category, message) = (e.category(), e.to_string());
            log::error!("asset download failed: {message}");
            sink.fail(category, message.as_str());
            RunOutcome::Failed {
                category: category.to_string(),
                message,
            }
        }
    }
}

async fn download_inner(
    specs: &[AssetSpec],
    models_dir: &Path,
    fetcher: &dyn FileFetcher,
    sink: &EventSink,
) -> Result<String, DownloadError> {
    let needed = missing_assets(specs, models_dir);
    if needed.is_empty() {
        return Ok("All model files already present.".to_string());
    }

    tokio::fs::create_dir_all(models_dir)
        .await
        .map_err(|e| DownloadError::Io(e.to_string()))?;

    for spec in needed {
        if sink.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        sink.progress(format!("Starting download of {}", spec.name));
        fetcher
            .fetch(spec, &spec.local_path(models_dir), sink)
            .await?;
        sink.milestone(spec.name.clone());
    }

    Ok("Model files downloaded successfully.".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressEvent;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Test fetcher: records the files it was asked for; optionally fails a
    /// configured file halfway through its (simulated) transfer.
    struct MockFetcher {
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl MockFetcher {
        fn ok() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(name: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Some(name.to_string()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FileFetcher for MockFetcher {
        async fn fetch(
            &self,
            spec: &AssetSpec,
            dest: &Path,
            sink: &EventSink,
        ) -> Result<(), DownloadError> {
            self.calls.lock().unwrap().push(spec.name.clone());
            sink.progress_count(format!("Downloading {}", spec.name), 50, Some(100));
            if self.fail_on.as_deref() == Some(spec.name.as_str()) {
                return Err(DownloadError::Request("connection reset".into()));
            }
            sink.progress_count(format!("Downloading {}", spec.name), 100, Some(100));
            tokio::fs::write(dest, b"model bytes").await.unwrap();
            Ok(())
        }
    }

    fn two_specs() -> Vec<AssetSpec> {
        vec![
            AssetSpec::new("first.onnx", "https://example.com/first.onnx"),
            AssetSpec::new("second.bin", "https://example.com/second.bin"),
        ]
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn downloads_every_missing_file_in_order() {
        let dir = tempdir().expect("temp dir");
        let fetcher = MockFetcher::ok();
        let (sink, mut rx) = EventSink::channel();

        let outcome = download_missing(&two_specs(), dir.path(), &fetcher, sink).await;

        assert!(outcome.is_completed());
        assert_eq!(fetcher.calls(), vec!["first.onnx", "second.bin"]);
        assert!(dir.path().join("first.onnx").exists());
        assert!(dir.path().join("second.bin").exists());

        let events = drain(&mut rx);
        let milestones: Vec<_> = events
            .iter()
            .filter_map(|ev| match ev {
                ProgressEvent::Milestone { name } => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(milestones, vec!["first.onnx", "second.bin"]);
        assert!(events.last().is_some_and(ProgressEvent::is_terminal));
        assert!(matches!(events.last(), Some(ProgressEvent::Done { .. })));
    }

    #[tokio::test]
    async fn first_failure_aborts_the_remaining_queue() {
        let dir = tempdir().expect("temp dir");
        let fetcher = MockFetcher::failing_on("first.onnx");
        let (sink, mut rx) = EventSink::channel();

        let outcome = download_missing(&two_specs(), dir.path(), &fetcher, sink).await;

        match outcome {
            RunOutcome::Failed { category, .. } => assert_eq!(category, "transient_io_error"),
            other => panic!("expected failure, got {other:?}"),
        }
        // The second file's transfer never started.
        assert_eq!(fetcher.calls(), vec!["first.onnx"]);
        assert!(!dir.path().join("second.bin").exists());

        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(ProgressEvent::Error { .. })));
    }

    #[tokio::test]
    async fn satisfied_catalog_completes_immediately() {
        let dir = tempdir().expect("temp dir");
        let specs = two_specs();
        for spec in &specs {
            std::fs::write(spec.local_path(dir.path()), b"already here").unwrap();
        }

        let fetcher = MockFetcher::ok();
        let (sink, mut rx) = EventSink::channel();
        let outcome = download_missing(&specs, dir.path(), &fetcher, sink).await;

        assert!(outcome.is_completed());
        assert!(fetcher.calls().is_empty());
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ProgressEvent::Done { .. }));
    }

    #[tokio::test]
    async fn disconnected_observer_cancels_before_the_next_file() {
        let dir = tempdir().expect("temp dir");
        let fetcher = MockFetcher::ok();
        let (sink, rx) = EventSink::channel();
        drop(rx);

        let outcome = download_missing(&two_specs(), dir.path(), &fetcher, sink).await;

        assert!(outcome.is_cancelled());
        assert!(fetcher.calls().is_empty());
    }
}
