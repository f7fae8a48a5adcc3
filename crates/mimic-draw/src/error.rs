//! Error types for settings and recorded input.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading drawing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The settings are not valid TOML for [`crate::DrawSettings`].
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid setting `{field}`: {message}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Errors that can occur while reading recorded frames.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// The recording could not be read.
    #[error("failed to read recording: {0}")]
    Io(#[from] std::io::Error),

    /// The recording is not a JSON array of frames.
    #[error("invalid recording: {0}")]
    Json(#[from] serde_json::Error),
}
