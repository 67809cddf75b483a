//! Why a settings load was refused.

use std::path::PathBuf;

use thiserror::Error;

/// A settings file that could not be used, or a value the server cannot run with.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The file is not JSON.
    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying parse failure.
        source: serde_json::Error,
    },
    /// The merged JSON does not fit the settings types, e.g. a string port.
    #[error("settings have the wrong shape: {0}")]
    Shape(#[from] serde_json::Error),
    /// A numeric setting that must be positive was zero.
    #[error("{key} must be at least 1")]
    MustBePositive {
        /// Dotted camelCase key, as written in the file.
        key: &'static str,
    },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
