//! Sliding window of decoded frames over a [`VideoReader`].
//!
//! Decodes ahead and drops behind, windowed explicitly rather than via a
//! background lookahead cache, since the identification pipeline needs
//! deterministic, rewindable access to a fixed span of frames at a time.

use vidid_core::frame::{FrameBuffer, PixelFormat};

use crate::error::{MediaError, Result};
use crate::reader::VideoReader;

/// Converts a decoded RGBA8 [`FrameBuffer`] back to a packed RGB24 byte
/// buffer suitable for [`crate::writer::VideoWriter::append_frame`]. The
/// inverse of the implicit conversion `FrameWindow` applies on decode.
pub fn frame_buffer_to_rgb24(frame: &FrameBuffer) -> Vec<u8> {
    let mut out = vec![0u8; frame.width as usize * frame.height as usize * 3];
    let plane = frame.primary_plane();
    for y in 0..frame.height {
        let row = plane.row(y);
        for x in 0..frame.width {
            let s = (x * 4) as usize;
            let d = (y as usize * frame.width as usize + x as usize) * 3;
            out[d] = row[s];
            out[d + 1] = row[s + 1];
            out[d + 2] = row[s + 2];
        }
    }
    out
}

fn rgb24_to_frame_buffer(rgb: &[u8], width: u32, height: u32) -> FrameBuffer {
    let mut out = FrameBuffer::new(width, height, PixelFormat::Rgba8);
    let plane = out.primary_plane_mut();
    for y in 0..height {
        let row = plane.row_mut(y);
        for x in 0..width {
            let s = (x * 3) as usize;
            let d = (x * 4) as usize;
            row[d] = rgb[(y as usize) * (width as usize) * 3 + s];
            row[d + 1] = rgb[(y as usize) * (width as usize) * 3 + s + 1];
            row[d + 2] = rgb[(y as usize) * (width as usize) * 3 + s + 2];
            row[d + 3] = 255;
        }
    }
    out
}

/// Holds up to `size` decoded frames from a [`VideoReader`], with at most
/// `size - overlap` new frames read per [`FrameWindow::next`] call.
pub struct FrameWindow<'r> {
    reader: &'r mut VideoReader,
    size: usize,
    overlap: usize,
    frames: Vec<FrameBuffer>,
    start: i64,
    end: i64,
    next_read: i64,
    exhausted: bool,
}

impl<'r> FrameWindow<'r> {
    pub fn new(reader: &'r mut VideoReader, size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(MediaError::InvalidArgument(
                "frame window size must be non-zero".into(),
            ));
        }
        if overlap >= size {
            return Err(MediaError::InvalidArgument(format!(
                "overlap ({overlap}) must be less than size ({size})"
            )));
        }
        Ok(FrameWindow {
            reader,
            size,
            overlap,
            frames: Vec::new(),
            start: -1,
            end: -1,
            next_read: 0,
            exhausted: false,
        })
    }

    /// The recommended window size for a video of `(width, height)`,
    /// targeting the default 1 GiB raw-image RAM budget.
    pub fn recommended_size(width: u32, height: u32, nframes: i64) -> usize {
        let recommended = vidid_core::memory_budget::recommended_window_size(width, height);
        recommended.min(nframes.max(1) as usize)
    }

    /// `(start, end)` absolute frame indices (inclusive) of the current
    /// window, or `(-1, -1)` before the first `next()`.
    pub fn get_buffer_range(&self) -> (i64, i64) {
        (self.start, self.end)
    }

    pub fn frames(&self) -> &[FrameBuffer] {
        &self.frames
    }

    pub fn frame(&self, absolute_index: i64) -> Option<&FrameBuffer> {
        if absolute_index < self.start || absolute_index > self.end {
            return None;
        }
        self.frames.get((absolute_index - self.start) as usize)
    }

    /// Advances the window: reads up to `size - overlap` new frames
    /// (or `size` on the very first call), dropping the oldest frames that
    /// fall out of the retained overlap. Returns `false` once the stream is
    /// exhausted and there is nothing left to read.
    pub fn next(&mut self) -> Result<bool> {
        if self.exhausted && self.frames.is_empty() {
            return Ok(false);
        }

        let keep = if self.start < 0 {
            0
        } else {
            self.overlap.min(self.frames.len())
        };
        if keep < self.frames.len() {
            self.frames.drain(0..self.frames.len() - keep);
        }

        let to_read = self.size - keep;
        let mut read_any = false;
        for _ in 0..to_read {
            match self.reader.read_frame()? {
                Some(decoded) => {
                    self.frames.push(rgb24_to_frame_buffer(
                        &decoded.rgb,
                        self.reader.width(),
                        self.reader.height(),
                    ));
                    self.next_read = decoded.frame_number + 1;
                    read_any = true;
                }
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }

        if self.frames.is_empty() {
            self.start = -1;
            self.end = -1;
            return Ok(false);
        }

        self.end = self.next_read - 1;
        self.start = self.end - self.frames.len() as i64 + 1;
        Ok(read_any || keep > 0)
    }

    /// Invalidates the current window and sets the next read position to
    /// absolute frame `f`. Must not be called while frames from the current
    /// window are still referenced elsewhere.
    pub fn seek_buffer(&mut self, f: i64) -> Result<()> {
        self.reader.seek_to_frame(f)?;
        self.frames.clear();
        self.start = -1;
        self.end = -1;
        self.next_read = f;
        self.exhausted = false;
        Ok(())
    }
}
