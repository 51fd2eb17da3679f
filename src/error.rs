//! Error types for NgView
//!
//! One error enum covers the store, the map model and the shell.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for NgView operations
#[derive(Error, Debug)]
pub enum NgViewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Unsupported data format: {0}")]
    UnsupportedFormat(String),

    #[error("Object not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Object already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Invalid store container '{}': {reason}", .path.display())]
    InvalidContainer { path: PathBuf, reason: String },

    #[error("Invalid map document: {0}")]
    InvalidDocument(String),

    #[error("Invalid option '{0}': {1}")]
    InvalidOption(String, String),

    #[error("Another task is already running")]
    AlreadyRunning,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage initialize failed: {0}")]
    Init(String),

    #[error("GUI error: {0}")]
    Gui(String),
}

/// Result type alias for NgView operations
pub type Result<T> = std::result::Result<T, NgViewError>;

impl NgViewError {
    /// Cancellation is reported as an outcome, never as a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, NgViewError::Cancelled)
    }

    /// Errors that leave the session usable (everything except init)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, NgViewError::Init(_))
    }
}
