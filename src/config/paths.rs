//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\doctalk\
//!   macOS:   ~/Library/Application Support/doctalk/
//!   Linux:   ~/.config/doctalk/
//!
//! Data dir (downloaded model assets):
//!   Windows: %LOCALAPPDATA%\doctalk\
//!   macOS:   ~/Library/Application Support/doctalk/
//!   Linux:   ~/.local/share/doctalk/
//!
//! Job output lands under ~/DocTalk/docs/ so finished audiobooks are easy
//! to find outside the app.

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for downloaded TTS model assets.
    pub models_dir: PathBuf,
    /// Default base directory for per-job output directories.
    pub output_base: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "doctalk";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let output_base = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("DocTalk")
            .join("docs");

        let settings_file = config_dir.join("settings.toml");
        let models_dir = data_dir.join("models");

        Self {
            config_dir,
            settings_file,
            models_dir,
            output_base,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
