//! Error types for the abstraction pipeline.
//!
//! Only caller contract violations surface as errors. Degenerate inputs
//! (empty frames, stranded pixels, missing congruencies, non-convergent
//! belief propagation) are absorbed by the stages themselves.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`AbstractionError`].
pub type Result<T> = std::result::Result<T, AbstractionError>;

/// Errors raised by the library.
#[derive(Error, Debug)]
pub enum AbstractionError {
    /// A per-pixel buffer does not match the configured render size.
    #[error("{buffer} buffer is {}x{}, expected {}x{}", actual.0, actual.1, expected.0, expected.1)]
    DimensionMismatch {
        /// Which buffer was rejected.
        buffer: &'static str,
        /// Configured (width, height).
        expected: (usize, usize),
        /// Received (width, height).
        actual: (usize, usize),
    },

    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references a vertex that does not exist.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidMesh {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// `render` was called before a model was loaded.
    #[error("no model loaded")]
    ModelNotLoaded,

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding or writing failed.
    #[error("failed to save image {path}: {source}")]
    Image {
        /// Destination file.
        path: PathBuf,
        /// Encoder error.
        source: image::ImageError,
    },

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed model or camera file.
    #[error("failed to parse {path}:{line}: {message}")]
    Parse {
        /// The file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Error message.
        message: String,
    },
}

impl AbstractionError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        AbstractionError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
