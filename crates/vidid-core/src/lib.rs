//! vidid-core - Foundation types for the person-identification pipeline.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Coord`: axis-aligned face rectangles with geometry operations
//! - `Sights`: fixed-length landmark point sets
//! - `FrameBuffer`: RGBA8 frame storage for crops and written output
//! - Image operations needed to build per-identity crops
//! - Small numeric helpers (linear regression, mean, n-gram counting)

pub mod coord;
pub mod error;
pub mod frame;
pub mod image_ops;
pub mod regression;
pub mod sights;

pub use coord::{Coord, MAX_COORD};
pub use error::{CoreError, Result};
pub use frame::{FrameBuffer, FramePlane, PixelFormat};
pub use regression::{fmean, linear_fct, linear_regression, symbols_to_items};
pub use sights::{Sight, Sights};

/// Memory budget constants for the sliding frame window.
pub mod memory_budget {
    /// Default target RAM budget for a FrameWindow's raw images (1 GiB).
    pub const FRAME_WINDOW_RAM_TARGET: usize = 1024 * 1024 * 1024;

    /// Recommended FrameWindow size given frame dimensions, targeting
    /// [`FRAME_WINDOW_RAM_TARGET`] bytes of raw RGB24 image data.
    pub fn recommended_window_size(width: u32, height: u32) -> usize {
        let per_frame = (width as usize) * (height as usize) * 3;
        if per_frame == 0 {
            return 1;
        }
        (FRAME_WINDOW_RAM_TARGET / per_frame).max(1)
    }
}
