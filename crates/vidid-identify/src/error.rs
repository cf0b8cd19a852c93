//! Error type for the identification orchestrator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error(
        "coords stream has {coords_frames} frames but the video has {video_frames} frames"
    )]
    LengthMismatch {
        coords_frames: usize,
        video_frames: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("identity not found: {0}")]
    NotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] vidid_core::CoreError),

    #[error(transparent)]
    Media(#[from] vidid_media::MediaError),

    #[error(transparent)]
    Vision(#[from] vidid_vision::VisionError),
}

pub type Result<T> = std::result::Result<T, IdentifyError>;
