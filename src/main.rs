//! Service entry point — doctalk.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Resolve [`AppPaths`] and make sure the output base exists.
//! 4. Build the stage engines (plain-text extractor, Ollama refiner,
//!    Kokoro client) and the shared job registry.
//! 5. Bind the configured address and serve the HTTP router until the
//!    process is terminated.

use std::sync::Arc;

use doctalk::assets::HttpFetcher;
use doctalk::config::{AppConfig, AppPaths};
use doctalk::extract::PlainTextExtractor;
use doctalk::jobs::{JobRegistry, Orchestrator, StageEngines};
use doctalk::llm::{OllamaRefiner, OllamaRegistry};
use doctalk::server::{router, AppContext};
use doctalk::tts::KokoroClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::load()?;
    let paths = AppPaths::new();
    std::fs::create_dir_all(&paths.output_base)?;

    let engines = StageEngines {
        extractor: Arc::new(PlainTextExtractor),
        refiner: Arc::new(OllamaRefiner::from_config(&config.llm)),
        synthesizer: Arc::new(KokoroClient::from_config(&config.tts)),
    };

    let registry = Arc::new(JobRegistry::new(paths.output_base.clone()));
    let orchestrator = Arc::new(Orchestrator::new(registry, engines, config.clone()));

    let ctx = Arc::new(AppContext {
        orchestrator,
        model_registry: Arc::new(OllamaRegistry::from_config(&config.llm)),
        fetcher: Arc::new(HttpFetcher::new()),
        config: config.clone(),
        paths: paths.clone(),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("doctalk listening on http://{addr}");
    log::info!("  output base: {}", paths.output_base.display());
    log::info!("  models dir:  {}", paths.models_dir.display());
    log::info!("  LLM runtime: {}", config.llm.base_url);
    log::info!("  TTS runtime: {}", config.tts.base_url);

    axum::serve(listener, router(ctx)).await?;
    Ok(())
}
