//! Per-identity portrait cropping: turns a full frame plus a face rectangle
//! into a letterboxed `(W, H)` canvas centered on that identity, per the
//! cropping recipe in the orchestrator's per-identity emission step.

use tracing::warn;
use vidid_core::frame::FrameBuffer;
use vidid_core::{image_ops, Coord};

/// Crops `frame` to `portrait`, resizes preserving aspect ratio to fit
/// inside `target`, and letterboxes the result onto a blank `target`-sized
/// canvas. Returns the canvas and `face`'s coordinates translated into that
/// canvas's space. Falls back to a blank canvas and the unmodified `face`
/// coordinates if any step is geometrically impossible.
pub fn crop_portrait(
    frame: &FrameBuffer,
    face: &Coord,
    portrait: &Coord,
    target: (u32, u32),
) -> (FrameBuffer, Coord) {
    match try_crop_portrait(frame, face, portrait, target) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "per-identity crop failed, emitting blank canvas");
            (image_ops::blank(target.0, target.1), face.copy())
        }
    }
}

fn try_crop_portrait(
    frame: &FrameBuffer,
    face: &Coord,
    portrait: &Coord,
    target: (u32, u32),
) -> vidid_core::Result<(FrameBuffer, Coord)> {
    let cropped = image_ops::crop(frame, portrait)?;

    let rel_x = (face.x() - portrait.x()).max(0);
    let rel_y = (face.y() - portrait.y()).max(0);

    let target_ratio = target.0 as f64 / target.1 as f64;
    let actual_ratio = cropped.width as f64 / cropped.height as f64;

    let (new_w, new_h) = if actual_ratio > target_ratio {
        let w = target.0;
        let h = ((cropped.height as f64) * (target.0 as f64 / cropped.width as f64))
            .round()
            .max(1.0) as u32;
        (w, h)
    } else {
        let h = target.1;
        let w = ((cropped.width as f64) * (target.1 as f64 / cropped.height as f64))
            .round()
            .max(1.0) as u32;
        (w, h)
    };
    let scale = new_w as f64 / cropped.width as f64;

    let resized = image_ops::resize(&cropped, new_w.min(target.0).max(1), new_h.min(target.1).max(1))?;

    let mut canvas = image_ops::blank(target.0, target.1);
    let off_x = (target.0 as i64 - resized.width as i64) / 2;
    let off_y = (target.1 as i64 - resized.height as i64) / 2;
    image_ops::paste(&mut canvas, &resized, off_x, off_y)?;

    let adjusted = Coord::new_signed(
        (rel_x as f64 * scale).round() as i64 + off_x,
        (rel_y as f64 * scale).round() as i64 + off_y,
        (face.w() as f64 * scale).round() as i64,
        (face.h() as f64 * scale).round() as i64,
        Some(face.confidence()),
    )?;

    Ok((canvas, adjusted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidid_core::frame::PixelFormat;

    #[test]
    fn crop_portrait_produces_target_sized_canvas() {
        let frame = FrameBuffer::test_pattern(640, 480);
        let face = Coord::with_score(100, 100, 80, 80, 0.9).unwrap();
        let portrait = face.default_portrait(Some((640, 480))).unwrap();

        let (canvas, adjusted) = crop_portrait(&frame, &face, &portrait, (320, 320));
        assert_eq!(canvas.width, 320);
        assert_eq!(canvas.height, 320);
        assert!(adjusted.w() > 0);
        assert!(adjusted.h() > 0);
    }

    #[test]
    fn crop_portrait_falls_back_to_blank_on_invalid_rect() {
        let frame = FrameBuffer::test_pattern(64, 64);
        let face = Coord::with_score(0, 0, 10, 10, 0.9).unwrap();
        let impossible_portrait = Coord::new(1000, 1000, 50, 50).unwrap();

        let (canvas, adjusted) = crop_portrait(&frame, &face, &impossible_portrait, (128, 128));
        assert_eq!(canvas.width, 128);
        assert_eq!(canvas.height, 128);
        assert_eq!(adjusted, face);
    }
}
