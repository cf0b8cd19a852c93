//! Pixel-level operations on [`crate::frame::FrameBuffer`] used while
//! building per-identity crops: cropping, resizing, pasting onto a canvas,
//! blurring and grayscale conversion.
//!
//! All operations work on `Rgba8` buffers; anything else is rejected with
//! [`CoreError::InvalidArgument`].

use crate::coord::Coord;
use crate::error::{CoreError, Result};
use crate::frame::{FrameBuffer, PixelFormat};

fn require_rgba8(frame: &FrameBuffer) -> Result<()> {
    if frame.format != PixelFormat::Rgba8 {
        return Err(CoreError::InvalidArgument(format!(
            "image op requires Rgba8, got {:?}",
            frame.format
        )));
    }
    Ok(())
}

/// Crop `frame` to the rectangle described by `coord`, clamped to the
/// frame's bounds.
pub fn crop(frame: &FrameBuffer, coord: &Coord) -> Result<FrameBuffer> {
    require_rgba8(frame)?;

    let x0 = coord.x().clamp(0, frame.width as i64) as u32;
    let y0 = coord.y().clamp(0, frame.height as i64) as u32;
    let x1 = (coord.x() + coord.w()).clamp(0, frame.width as i64) as u32;
    let y1 = (coord.y() + coord.h()).clamp(0, frame.height as i64) as u32;

    if x1 <= x0 || y1 <= y0 {
        return Err(CoreError::OutOfRange(
            "crop rectangle does not intersect the frame".into(),
        ));
    }

    let out_w = x1 - x0;
    let out_h = y1 - y0;
    let mut out = FrameBuffer::new(out_w, out_h, PixelFormat::Rgba8);

    let src = frame.primary_plane();
    let dst = out.primary_plane_mut();
    for row in 0..out_h {
        let src_row = src.row(y0 + row);
        let dst_row = dst.row_mut(row);
        let start = (x0 * 4) as usize;
        let end = start + (out_w * 4) as usize;
        dst_row.copy_from_slice(&src_row[start..end]);
    }

    Ok(out)
}

/// Nearest-neighbor resize of `frame` to `(width, height)`.
pub fn resize(frame: &FrameBuffer, width: u32, height: u32) -> Result<FrameBuffer> {
    require_rgba8(frame)?;
    if width == 0 || height == 0 {
        return Err(CoreError::InvalidArgument(
            "resize target dimensions must be non-zero".into(),
        ));
    }

    let mut out = FrameBuffer::new(width, height, PixelFormat::Rgba8);
    let src = frame.primary_plane();

    for y in 0..height {
        let src_y = (y as u64 * frame.height as u64 / height as u64) as u32;
        let src_y = src_y.min(frame.height.saturating_sub(1));
        let src_row = src.row(src_y);
        let dst = out.primary_plane_mut();
        let dst_row = dst.row_mut(y);
        for x in 0..width {
            let src_x = (x as u64 * frame.width as u64 / width as u64) as u32;
            let src_x = src_x.min(frame.width.saturating_sub(1));
            let s = (src_x * 4) as usize;
            let d = (x * 4) as usize;
            dst_row[d..d + 4].copy_from_slice(&src_row[s..s + 4]);
        }
    }

    Ok(out)
}

/// Create a blank opaque-black canvas of the given size.
pub fn blank(width: u32, height: u32) -> FrameBuffer {
    FrameBuffer::new(width, height, PixelFormat::Rgba8)
}

/// Paste `src` onto `dst` at `(x, y)`, clipping whatever falls outside of
/// `dst`'s bounds.
pub fn paste(dst: &mut FrameBuffer, src: &FrameBuffer, x: i64, y: i64) -> Result<()> {
    require_rgba8(dst)?;
    require_rgba8(src)?;

    for row in 0..src.height {
        let dy = y + row as i64;
        if dy < 0 || dy >= dst.height as i64 {
            continue;
        }
        let src_row = src.primary_plane().row(row);
        for col in 0..src.width {
            let dx = x + col as i64;
            if dx < 0 || dx >= dst.width as i64 {
                continue;
            }
            let s = (col * 4) as usize;
            let pixel = &src_row[s..s + 4];
            let dst_row = dst.primary_plane_mut().row_mut(dy as u32);
            let d = (dx * 4) as usize;
            dst_row[d..d + 4].copy_from_slice(pixel);
        }
    }

    Ok(())
}

/// Convert `frame` to grayscale in place (luma in all three color channels,
/// alpha untouched), using the Rec. 601 luma weights.
pub fn grayscale(frame: &mut FrameBuffer) -> Result<()> {
    require_rgba8(frame)?;
    let height = frame.height;
    let width = frame.width;
    let plane = frame.primary_plane_mut();
    for y in 0..height {
        let row = plane.row_mut(y);
        for x in 0..width {
            let i = (x * 4) as usize;
            let r = row[i] as f32;
            let g = row[i + 1] as f32;
            let b = row[i + 2] as f32;
            let luma = (0.299 * r + 0.587 * g + 0.114 * b).round() as u8;
            row[i] = luma;
            row[i + 1] = luma;
            row[i + 2] = luma;
        }
    }
    Ok(())
}

/// A simple separable box blur with the given radius (in pixels).
pub fn box_blur(frame: &FrameBuffer, radius: u32) -> Result<FrameBuffer> {
    require_rgba8(frame)?;
    if radius == 0 {
        return Ok(frame.clone());
    }

    let width = frame.width;
    let height = frame.height;
    let src = frame.primary_plane();

    // horizontal pass
    let mut horiz = FrameBuffer::new(width, height, PixelFormat::Rgba8);
    {
        let dst = horiz.primary_plane_mut();
        for y in 0..height {
            let row = src.row(y);
            let dst_row = dst.row_mut(y);
            for x in 0..width {
                let lo = x.saturating_sub(radius);
                let hi = (x + radius).min(width - 1);
                let count = (hi - lo + 1) as u32;
                let mut sums = [0u32; 4];
                for sx in lo..=hi {
                    let i = (sx * 4) as usize;
                    for c in 0..4 {
                        sums[c] += row[i + c] as u32;
                    }
                }
                let d = (x * 4) as usize;
                for c in 0..4 {
                    dst_row[d + c] = (sums[c] / count) as u8;
                }
            }
        }
    }

    // vertical pass
    let mut out = FrameBuffer::new(width, height, PixelFormat::Rgba8);
    {
        let src2 = horiz.primary_plane();
        let dst = out.primary_plane_mut();
        for y in 0..height {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(height - 1);
            let count = (hi - lo + 1) as u32;
            let dst_row = dst.row_mut(y);
            for x in 0..width {
                let mut sums = [0u32; 4];
                for sy in lo..=hi {
                    let row = src2.row(sy);
                    let i = (x * 4) as usize;
                    for c in 0..4 {
                        sums[c] += row[i + c] as u32;
                    }
                }
                let d = (x * 4) as usize;
                for c in 0..4 {
                    dst_row[d + c] = (sums[c] / count) as u8;
                }
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_extracts_expected_region() {
        let frame = FrameBuffer::test_pattern(16, 8);
        let coord = Coord::new(0, 0, 4, 4).unwrap();
        let cropped = crop(&frame, &coord).unwrap();
        assert_eq!(cropped.width, 4);
        assert_eq!(cropped.height, 4);
    }

    #[test]
    fn crop_rejects_rectangle_outside_frame() {
        let frame = FrameBuffer::test_pattern(16, 8);
        let coord = Coord::new(100, 100, 4, 4).unwrap();
        assert!(crop(&frame, &coord).is_err());
    }

    #[test]
    fn resize_changes_dimensions_only() {
        let frame = FrameBuffer::test_pattern(16, 8);
        let resized = resize(&frame, 32, 16).unwrap();
        assert_eq!(resized.width, 32);
        assert_eq!(resized.height, 16);
    }

    #[test]
    fn paste_clips_out_of_bounds_region() {
        let mut dst = blank(8, 8);
        let src = FrameBuffer::test_pattern(16, 16);
        assert!(paste(&mut dst, &src, -4, -4).is_ok());
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let mut frame = FrameBuffer::test_pattern(4, 4);
        grayscale(&mut frame).unwrap();
        let row = frame.primary_plane().row(0);
        assert_eq!(row[0], row[1]);
        assert_eq!(row[1], row[2]);
    }
}
