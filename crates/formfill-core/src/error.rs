//! Error types for coordinate and schema handling.
//!
//! Malformed geometry is never an error here: the normalizer returns `None`
//! and callers skip the element. Errors are reserved for I/O and data files
//! the caller asked us to read or write.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the form-fill core.
#[derive(Error, Debug)]
pub enum FormFillError {
    /// File I/O error (coordinate maps, override entries, source images).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A persisted coordinate map exists but its contents are unusable.
    ///
    /// The orchestrator treats this as recoverable and falls back to fresh
    /// layout analysis.
    #[error("Invalid coordinate map {path}: {reason}")]
    InvalidCoordinateMap {
        /// File the map was read from
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The external layout analyzer failed.
    #[error("Layout analysis failed: {0}")]
    AnalysisError(String),
}

/// Result type alias for form-fill core operations.
pub type Result<T> = std::result::Result<T, FormFillError>;
