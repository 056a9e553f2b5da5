//! Model asset management: required-file catalog and downloader.
//!
//! * [`AssetSpec`] / [`default_assets`] — the required-file catalog, injected
//!   through configuration.
//! * [`is_present`] / [`missing_assets`] — presence checks used by the
//!   readiness report.
//! * [`download_missing`] — sequential, fail-fast downloader streaming
//!   byte-level progress; [`FileFetcher`] / [`HttpFetcher`] are the
//!   per-file transfer boundary.

pub mod catalog;
pub mod download;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use catalog::{default_assets, is_present, missing_assets, AssetSpec};
pub use download::{download_missing, DownloadError, FileFetcher, HttpFetcher};
