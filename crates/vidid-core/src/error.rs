//! Error types shared across every crate in the pipeline.

use thiserror::Error;

/// Error type for `vidid-core` operations: coordinates, frame buffers,
/// geometry helpers.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("length mismatch: {0}")]
    LengthMismatch(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Result type alias for `vidid-core` operations.
pub type Result<T> = std::result::Result<T, CoreError>;
