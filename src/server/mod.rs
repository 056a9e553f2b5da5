//! HTTP surface — a thin presentation layer over the core's event stream.
//!
//! Every mutating route spawns its run on its own task and immediately
//! returns the run's progress channel as a newline-delimited JSON response
//! body (`application/x-ndjson`).  When the client drops the connection,
//! the receiver half of the channel drops with it and the run observes
//! cancellation at its next chunk boundary.
//!
//! Routes:
//!
//! | Route                          | Kind                 |
//! |--------------------------------|----------------------|
//! | `POST /jobs/extract`           | NDJSON event stream  |
//! | `POST /jobs/{id}/refine`       | NDJSON event stream  |
//! | `POST /jobs/{id}/synthesize`   | NDJSON event stream  |
//! | `GET  /jobs/{id}/status`       | JSON                 |
//! | `GET  /jobs/{id}/audio`        | WAV bytes            |
//! | `GET  /health[/llm\|/assets]`  | JSON readiness       |
//! | `POST /assets/download`        | NDJSON event stream  |

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::io::ReaderStream;

use crate::assets::{download_missing, FileFetcher};
use crate::config::{AppConfig, AppPaths};
use crate::health::{check_all, check_assets, check_llm, AssetReadiness, LlmReadiness, ReadinessReport};
use crate::jobs::Orchestrator;
use crate::llm::ModelRegistry;
use crate::progress::{encode_frame, EventSink, ProgressEvent};

// ---------------------------------------------------------------------------
// AppContext
// ---------------------------------------------------------------------------

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppContext {
    pub orchestrator: Arc<Orchestrator>,
    pub model_registry: Arc<dyn ModelRegistry>,
    pub fetcher: Arc<dyn FileFetcher>,
    pub config: AppConfig,
    pub paths: AppPaths,
}

/// Build the service router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/jobs/extract", post(extract))
        .route("/jobs/{job_id}/refine", post(refine))
        .route("/jobs/{job_id}/synthesize", post(synthesize))
        .route("/jobs/{job_id}/status", get(job_status))
        .route("/jobs/{job_id}/audio", get(job_audio))
        .route("/health", get(health))
        .route("/health/llm", get(health_llm))
        .route("/health/assets", get(health_assets))
        .route("/assets/download", post(assets_download))
        .with_state(ctx)
}

/// Wrap a run's event channel as a streaming NDJSON response body.
fn event_stream_response(rx: UnboundedReceiver<ProgressEvent>) -> Response {
    let frames = UnboundedReceiverStream::new(rx)
        .map(|event: ProgressEvent| Ok::<_, Infallible>(Bytes::from(encode_frame(&event))));
    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(frames),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Stage routes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// Local path of the document to convert.
    pub input_path: String,
    /// Optional output directory; defaults to
    /// `<output_base>/<document stem>/`.
    #[serde(default)]
    pub out_dir: Option<String>,
}

/// `POST /jobs/extract` — create a job and run the extract stage.
async fn extract(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<ExtractRequest>,
) -> Response {
    let (sink, rx) = EventSink::channel();
    let orchestrator = Arc::clone(&ctx.orchestrator);
    tokio::spawn(async move {
        let input = PathBuf::from(request.input_path);
        let out_dir = request.out_dir.map(PathBuf::from);
        orchestrator.run_extract(&input, out_dir, sink).await;
    });
    event_stream_response(rx)
}

/// `POST /jobs/{job_id}/refine` — run the refine stage.
async fn refine(State(ctx): State<Arc<AppContext>>, Path(job_id): Path<String>) -> Response {
    let (sink, rx) = EventSink::channel();
    let orchestrator = Arc::clone(&ctx.orchestrator);
    tokio::spawn(async move {
        orchestrator.run_refine(&job_id, sink).await;
    });
    event_stream_response(rx)
}

/// `POST /jobs/{job_id}/synthesize` — run the synthesize stage.
async fn synthesize(State(ctx): State<Arc<AppContext>>, Path(job_id): Path<String>) -> Response {
    let (sink, rx) = EventSink::channel();
    let orchestrator = Arc::clone(&ctx.orchestrator);
    tokio::spawn(async move {
        orchestrator.run_synthesize(&job_id, sink).await;
    });
    event_stream_response(rx)
}

// ---------------------------------------------------------------------------
// Job inspection routes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct StageFlags {
    extract: bool,
    refine: bool,
    synthesize: bool,
}

#[derive(Debug, Serialize)]
struct JobStatus {
    job_id: String,
    doc_name: String,
    out_dir: String,
    stage: &'static str,
    stages: StageFlags,
}

/// `GET /jobs/{job_id}/status` — which stages have produced artifacts.
async fn job_status(
    State(ctx): State<Arc<AppContext>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatus>, (StatusCode, String)> {
    let record = ctx.orchestrator.registry().resolve(&job_id);
    if !record.dir.exists() {
        return Err((StatusCode::NOT_FOUND, format!("job '{job_id}' not found")));
    }

    Ok(Json(JobStatus {
        job_id,
        doc_name: record.doc_name.clone(),
        out_dir: record.dir.display().to_string(),
        stage: record.stage.label(),
        stages: StageFlags {
            extract: record.extracted_path().exists(),
            refine: record.refined_path().exists(),
            synthesize: record.audio_path().exists(),
        },
    }))
}

/// `GET /jobs/{job_id}/audio` — stream the final WAV artifact.
async fn job_audio(
    State(ctx): State<Arc<AppContext>>,
    Path(job_id): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let record = ctx.orchestrator.registry().resolve(&job_id);
    let path = record.audio_path();

    let file = tokio::fs::File::open(&path).await.map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            format!(
                "{} not found — run the synthesize stage first",
                path.display()
            ),
        )
    })?;
    let length = file.metadata().await.ok().map(|m| m.len());

    let mut response = (
        [(header::CONTENT_TYPE, "audio/wav")],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response();
    if let Some(length) = length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, length.into());
    }
    Ok(response)
}

// ---------------------------------------------------------------------------
// Readiness routes
// ---------------------------------------------------------------------------

/// `GET /health` — combined dependency readiness snapshot.
async fn health(State(ctx): State<Arc<AppContext>>) -> Json<ReadinessReport> {
    Json(
        check_all(
            ctx.model_registry.as_ref(),
            &ctx.config.llm.known_models,
            ctx.config.llm.model_override.as_deref(),
            &ctx.config.assets,
            &ctx.paths.models_dir,
        )
        .await,
    )
}

/// `GET /health/llm` — language-model check only.
async fn health_llm(State(ctx): State<Arc<AppContext>>) -> Json<LlmReadiness> {
    Json(
        check_llm(
            ctx.model_registry.as_ref(),
            &ctx.config.llm.known_models,
            ctx.config.llm.model_override.as_deref(),
        )
        .await,
    )
}

/// `GET /health/assets` — asset-file check only.
async fn health_assets(State(ctx): State<Arc<AppContext>>) -> Json<AssetReadiness> {
    Json(check_assets(&ctx.config.assets, &ctx.paths.models_dir))
}

// ---------------------------------------------------------------------------
// Asset download route
// ---------------------------------------------------------------------------

/// `POST /assets/download` — fetch missing model files, streaming progress.
async fn assets_download(State(ctx): State<Arc<AppContext>>) -> Response {
    let (sink, rx) = EventSink::channel();
    let ctx = Arc::clone(&ctx);
    tokio::spawn(async move {
        download_missing(
            &ctx.config.assets,
            &ctx.paths.models_dir,
            ctx.fetcher.as_ref(),
            sink,
        )
        .await;
    });
    event_stream_response(rx)
}
