//! Error type for the identity-recognition backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    /// The requested model was not cached and no download is configured.
    #[error("model not found: {model_id}")]
    ModelNotFound { model_id: String },

    /// ONNX Runtime error.
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    Onnx(#[from] ort::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] vidid_core::CoreError),
}

pub type Result<T> = std::result::Result<T, VisionError>;
