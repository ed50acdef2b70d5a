//! Overlay errors
//!
//! Everything here is fatal to the caller: an unreadable source image or an
//! unwritable output path cannot be recovered in-process and is not retried.

use formfill_core::FormFillError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening, drawing or saving a form image
#[derive(Error, Debug)]
pub enum OverlayError {
    /// The source image could not be opened or decoded
    #[error("Failed to open image {path}: {source}")]
    ImageOpen {
        /// Image path
        path: PathBuf,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },

    /// The filled image could not be encoded
    #[error("Failed to encode filled image: {0}")]
    Encode(#[source] image::ImageError),

    /// The output file could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Error from the placement core (coordinate maps, layout analysis)
    #[error(transparent)]
    Core(#[from] FormFillError),
}

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, OverlayError>;
