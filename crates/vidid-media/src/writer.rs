//! Encodes a stream of RGB24 frames to a video file via an `ffmpeg`
//! subprocess fed over stdin.

use std::io::Write;
use std::path::{Path, PathBuf};

use ffmpeg_sidecar::command::FfmpegCommand;
use tracing::info;

use crate::error::{MediaError, Result};

/// Writes a fixed-size, fixed-fps RGB24 stream to an output video.
///
/// Opened once with `(width, height, fps)`; every appended frame must match
/// that size. Must be `close()`d (or dropped) to flush and finish encoding.
pub struct VideoWriter {
    width: u32,
    height: u32,
    child: Option<ffmpeg_sidecar::child::FfmpegChild>,
    stdin: Option<std::process::ChildStdin>,
    frames_written: u64,
}

impl VideoWriter {
    pub fn open<P: AsRef<Path>>(path: P, width: u32, height: u32, fps: f64) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MediaError::InvalidArgument(
                "output width/height must be non-zero".into(),
            ));
        }
        if fps <= 0.0 {
            return Err(MediaError::InvalidArgument(format!(
                "output fps must be positive, got {fps}"
            )));
        }

        let path: PathBuf = path.as_ref().to_path_buf();
        info!(path = %path.display(), width, height, fps, "opening video writer");

        let mut child = FfmpegCommand::new()
            .format("rawvideo")
            .pix_fmt("rgb24")
            .size(width, height)
            .rate(fps)
            .input("-")
            .codec_video("libx264")
            .arg("-pix_fmt")
            .arg("yuv420p")
            .overwrite()
            .output(path.to_string_lossy())
            .spawn()
            .map_err(|e| MediaError::Ffmpeg(format!("failed to spawn ffmpeg encoder: {e}")))?;

        let stdin = child
            .take_stdin()
            .ok_or_else(|| MediaError::Ffmpeg("encoder stdin unavailable".into()))?;

        Ok(VideoWriter {
            width,
            height,
            child: Some(child),
            stdin: Some(stdin),
            frames_written: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Appends one RGB24 frame. `rgb.len()` must equal `width * height * 3`.
    pub fn append_frame(&mut self, rgb: &[u8]) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 3;
        if rgb.len() != expected {
            return Err(MediaError::InvalidArgument(format!(
                "frame has {} bytes, expected {expected}",
                rgb.len()
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MediaError::InvalidArgument("writer already closed".into()))?;
        stdin
            .write_all(rgb)
            .map_err(|e| MediaError::Ffmpeg(format!("failed to write frame to encoder: {e}")))?;
        self.frames_written += 1;
        Ok(())
    }

    /// Closes stdin and waits for the encoder process to finish.
    pub fn close(&mut self) -> Result<()> {
        self.stdin.take();
        if let Some(mut child) = self.child.take() {
            child
                .wait()
                .map_err(|e| MediaError::Ffmpeg(format!("encoder process failed: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
