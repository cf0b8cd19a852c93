//! Decodes a video to RGB24 frames via an `ffmpeg` subprocess.
//!
//! Uses `ffmpeg-sidecar` rather than `ffmpeg-next` so the crate has no
//! dependency on system FFmpeg development headers: the sidecar process is
//! downloaded on first use (or picked up from `PATH`) and driven purely
//! through stdin/stdout/stderr.

use std::path::{Path, PathBuf};

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, Stream};
use tracing::{debug, info, warn};

use crate::error::{MediaError, Result};

/// A single decoded RGB24 frame and its absolute frame index in the video.
pub struct DecodedFrame {
    pub frame_number: i64,
    pub rgb: Vec<u8>,
}

/// Opens a video file and yields decoded RGB24 frames by absolute index.
///
/// `VideoReader` is the sole owner of the underlying `ffmpeg` child process;
/// seeking kills and respawns it, so frames obtained before a seek must not
/// be used afterward (mirrors the contract `FrameWindow::seek_buffer`
/// documents at a higher level).
pub struct VideoReader {
    path: PathBuf,
    width: u32,
    height: u32,
    fps: f64,
    nframes: i64,
    next_frame: i64,
    child: Option<ffmpeg_sidecar::child::FfmpegChild>,
    pending: std::collections::VecDeque<DecodedFrame>,
    exhausted: bool,
}

impl VideoReader {
    /// Opens `path`, probing fps/width/height/frame count from `ffmpeg`'s
    /// own stream banner before any frame is decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(MediaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("video file not found: {}", path.display()),
            )));
        }

        ffmpeg_sidecar::download::auto_download()
            .map_err(|e| MediaError::Ffmpeg(format!("failed to locate ffmpeg: {e}")))?;

        info!(path = %path.display(), "opening video");

        let mut reader = VideoReader {
            path,
            width: 0,
            height: 0,
            fps: 0.0,
            nframes: 0,
            next_frame: 0,
            child: None,
            pending: std::collections::VecDeque::new(),
            exhausted: false,
        };
        reader.spawn_from(0)?;
        reader.probe_metadata()?;
        Ok(reader)
    }

    fn spawn_from(&mut self, start_frame: i64) -> Result<()> {
        let mut cmd = FfmpegCommand::new();
        if start_frame > 0 && self.fps > 0.0 {
            let start_secs = start_frame as f64 / self.fps;
            cmd.args(["-ss", &format!("{start_secs:.6}")]);
        }
        let child = cmd
            .input(self.path.to_string_lossy())
            .rawvideo()
            .spawn()
            .map_err(|e| MediaError::Ffmpeg(format!("failed to spawn ffmpeg: {e}")))?;

        self.child = Some(child);
        self.next_frame = start_frame;
        self.exhausted = false;
        self.pending.clear();
        Ok(())
    }

    /// Pulls events from the running process until dimensions/fps are known
    /// and a frame count estimate exists (from the stream duration).
    fn probe_metadata(&mut self) -> Result<()> {
        if self.width != 0 {
            return Ok(());
        }
        let child = self.child.as_mut().expect("child spawned before probe");
        let iter = child
            .iter()
            .map_err(|e| MediaError::Ffmpeg(format!("failed to read ffmpeg events: {e}")))?;

        let mut duration_secs = 0.0f64;
        for event in iter {
            match event {
                FfmpegEvent::ParsedInputStream(Stream {
                    width: Some(w),
                    height: Some(h),
                    fps: Some(fps),
                    ..
                }) => {
                    self.width = w;
                    self.height = h;
                    self.fps = fps as f64;
                }
                FfmpegEvent::ParsedDuration(d) => {
                    duration_secs = d.duration as f64;
                }
                FfmpegEvent::OutputFrame(frame) => {
                    // Metadata banner is complete; stash this frame and stop probing.
                    self.pending.push_back(DecodedFrame {
                        frame_number: 0,
                        rgb: frame.data,
                    });
                    break;
                }
                FfmpegEvent::Error(e) | FfmpegEvent::Log(_, e) => {
                    debug!(message = %e, "ffmpeg log line");
                }
                _ => {}
            }
        }

        if self.width == 0 || self.height == 0 || self.fps <= 0.0 {
            return Err(MediaError::Ffmpeg(format!(
                "could not determine stream metadata for {}",
                self.path.display()
            )));
        }
        self.nframes = (duration_secs * self.fps).round() as i64;
        if self.nframes <= 0 && !self.pending.is_empty() {
            // Very short clips sometimes under-report duration; fall back to
            // counting frames as they are decoded (see `read_frame`).
            self.nframes = i64::MAX;
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn nframes(&self) -> i64 {
        self.nframes
    }

    pub fn frame_size_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Decodes and returns the next frame in sequence, or `None` at end of
    /// stream.
    pub fn read_frame(&mut self) -> Result<Option<DecodedFrame>> {
        if self.exhausted {
            return Ok(None);
        }
        if let Some(mut frame) = self.pending.pop_front() {
            frame.frame_number = self.next_frame;
            self.next_frame += 1;
            return Ok(Some(frame));
        }

        let child = match self.child.as_mut() {
            Some(c) => c,
            None => return Ok(None),
        };
        let iter = child
            .iter()
            .map_err(|e| MediaError::Ffmpeg(format!("failed to read ffmpeg events: {e}")))?;

        for event in iter {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    let out = DecodedFrame {
                        frame_number: self.next_frame,
                        rgb: frame.data,
                    };
                    self.next_frame += 1;
                    return Ok(Some(out));
                }
                FfmpegEvent::Error(e) => {
                    warn!(error = %e, "ffmpeg reported an error; continuing");
                }
                FfmpegEvent::Done => break,
                _ => {}
            }
        }

        self.exhausted = true;
        if self.nframes == i64::MAX {
            self.nframes = self.next_frame;
        }
        Ok(None)
    }

    /// Seeks to `frame_number`, invalidating any frames obtained before the
    /// call. Respawns the underlying process with `-ss` input seeking.
    pub fn seek_to_frame(&mut self, frame_number: i64) -> Result<()> {
        if frame_number < 0 || (self.nframes != i64::MAX && frame_number >= self.nframes) {
            return Err(MediaError::OutOfRange(format!(
                "frame {frame_number} out of range (0..{})",
                self.nframes
            )));
        }
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
        }
        self.spawn_from(frame_number)
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
        }
    }
}
