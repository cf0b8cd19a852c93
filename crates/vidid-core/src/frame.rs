//! Frame buffer type for video frames in CPU memory.
//!
//! The pipeline only ever decodes, crops, and writes RGBA8 frames, so unlike
//! a general-purpose compositor's frame buffer this one carries a single
//! packed plane rather than a per-format plane layout.

use serde::{Deserialize, Serialize};

/// Pixel format. Kept as an enum (rather than collapsing `FrameBuffer` to a
/// bare RGBA8 struct) so a future decoder/backend can add a format without
/// breaking the public shape of [`FrameBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit RGBA (32 bits per pixel). The only format this crate produces.
    #[default]
    Rgba8,
}

/// A plane of pixel data with stride information.
#[derive(Debug, Clone)]
pub struct FramePlane {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Bytes per row (may include padding)
    pub stride: usize,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl FramePlane {
    /// Create a new frame plane with the given dimensions.
    pub fn new(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        // Align stride to 64 bytes for SIMD compatibility.
        let min_stride = (width as usize) * bytes_per_pixel;
        let stride = (min_stride + 63) & !63;
        let data = vec![0u8; stride * height as usize];
        Self {
            data,
            stride,
            width,
            height,
        }
    }

    /// Get a row of pixel data.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        let bpp = self.bytes_per_row_pixel();
        let end = start + (self.width as usize * bpp);
        &self.data[start..end]
    }

    /// Get a mutable row of pixel data.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let bpp = self.bytes_per_row_pixel();
        let end = start + (self.width as usize * bpp);
        &mut self.data[start..end]
    }

    fn bytes_per_row_pixel(&self) -> usize {
        if self.width == 0 || self.stride == 0 {
            return 1;
        }
        let min_bpp = self.stride / self.width as usize;
        if min_bpp == 0 {
            1
        } else {
            min_bpp
        }
    }
}

/// A video frame in CPU memory: one RGBA8 plane, 64-byte-aligned rows.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// Pixel format (always [`PixelFormat::Rgba8`] today).
    pub format: PixelFormat,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel data plane
    pub plane: FramePlane,
}

impl FrameBuffer {
    /// Create a new frame buffer with the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let plane = match format {
            PixelFormat::Rgba8 => FramePlane::new(width, height, 4),
        };
        Self {
            format,
            width,
            height,
            plane,
        }
    }

    /// Total memory usage of this frame in bytes.
    pub fn memory_size(&self) -> usize {
        self.plane.data.len()
    }

    /// Get the primary (only) plane.
    #[inline]
    pub fn primary_plane(&self) -> &FramePlane {
        &self.plane
    }

    /// Get the primary (only) plane mutably.
    #[inline]
    pub fn primary_plane_mut(&mut self) -> &mut FramePlane {
        &mut self.plane
    }

    /// Create a test pattern frame (color bars).
    pub fn test_pattern(width: u32, height: u32) -> Self {
        let mut frame = Self::new(width, height, PixelFormat::Rgba8);
        let plane = frame.primary_plane_mut();

        for y in 0..height {
            let row = plane.row_mut(y);
            for x in 0..width {
                let i = (x * 4) as usize;
                let bar = (x * 8 / width) as u8;
                let colors: [[u8; 4]; 8] = [
                    [255, 255, 255, 255], // White
                    [255, 255, 0, 255],   // Yellow
                    [0, 255, 255, 255],   // Cyan
                    [0, 255, 0, 255],     // Green
                    [255, 0, 255, 255],   // Magenta
                    [255, 0, 0, 255],     // Red
                    [0, 0, 255, 255],     // Blue
                    [0, 0, 0, 255],       // Black
                ];
                let color = colors[bar as usize];
                row[i..i + 4].copy_from_slice(&color);
            }
        }

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba8_frame_size() {
        let frame = FrameBuffer::new(1920, 1080, PixelFormat::Rgba8);
        assert!(frame.memory_size() >= 1920 * 1080 * 4);
    }

    #[test]
    fn test_test_pattern() {
        let frame = FrameBuffer::test_pattern(1920, 1080);
        assert_eq!(frame.width, 1920);
        assert_eq!(frame.height, 1080);

        let row = frame.primary_plane().row(0);
        assert_eq!(row[0..4], [255, 255, 255, 255]);
    }
}
