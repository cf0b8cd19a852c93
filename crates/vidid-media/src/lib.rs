//! vidid-media - video I/O for the person-identification pipeline.
//!
//! Wraps `ffmpeg` (via `ffmpeg-sidecar`, no system FFmpeg headers needed)
//! for decode ([`VideoReader`]) and encode ([`VideoWriter`]), plus the
//! sliding [`FrameWindow`] the orchestrator iterates over.

pub mod error;
pub mod frame_window;
pub mod reader;
pub mod writer;

pub use error::{MediaError, Result};
pub use frame_window::{frame_buffer_to_rgb24, FrameWindow};
pub use reader::{DecodedFrame, VideoReader};
pub use writer::VideoWriter;
