//! doctalk — turn a document into a spoken audio file.
//!
//! A local companion service that converts documents in three sequential,
//! independently invokable stages, streaming fine-grained progress for each:
//!
//! ```text
//! document ──extract──▶ text ──refine──▶ cleaned text ──synthesize──▶ WAV
//!              │                 │                          │
//!              ▼                 ▼                          ▼
//!       PlainTextExtractor   Ollama LLM             Kokoro TTS server
//! ```
//!
//! # Modules
//!
//! * [`progress`] — streamed status protocol (events, sink, NDJSON framing).
//! * [`chunk`]    — refinement/sentence chunkers and the audio stitcher.
//! * [`extract`]  — document text-extraction boundary.
//! * [`llm`]      — text refinement and the model registry (Ollama).
//! * [`tts`]      — speech synthesis boundary (Kokoro).
//! * [`assets`]   — required model-file catalog and downloader.
//! * [`health`]   — dependency readiness checks.
//! * [`jobs`]     — job registry and the stage orchestrator.
//! * [`server`]   — the HTTP adapter over the core's event stream.
//! * [`config`]   — settings, defaults and platform paths.

pub mod assets;
pub mod chunk;
pub mod config;
pub mod extract;
pub mod health;
pub mod jobs;
pub mod llm;
pub mod progress;
pub mod server;
pub mod tts;
