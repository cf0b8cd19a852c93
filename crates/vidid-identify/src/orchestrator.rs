//! The three-pass identity orchestrator.
//!
//! Pass 1 walks the raw detections once to discover and deduplicate candidate
//! identities. Pass 2 re-walks the video, assigning an identity to every
//! detection and filtering out isolated or scattered false positives window
//! by window. Pass 3 re-walks a third time with a dedicated, shorter window
//! to smooth each identity's trajectory by linear regression and emit the
//! per-identity and aggregate output streams.
//!
//! Reports progress through a callback: a weighted stage plus an
//! `overall_progress` in `[0, 1]`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vidid_core::regression::{fmean, linear_fct, linear_regression, symbols_to_items};
use vidid_core::{image_ops, Coord};
use vidid_media::{frame_buffer_to_rgb24, FrameWindow, VideoReader};
use vidid_vision::{coords_similarity, HeuristicRecognizer, ImagesSimilarity, RecognizerBackend};

use crate::buffers::IdCoordsBuffer;
use crate::config::Config;
use crate::coords_io::{self, CoordsFormat};
use crate::error::{IdentifyError, Result};
use crate::per_identity;
use crate::writers::OutputSinks;

/// Stages of a full `identify` run, each carrying a fixed weight toward
/// overall progress (weights sum to 100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifyStage {
    /// Pass 1: discovering and deduplicating candidate identities.
    Discovery,
    /// Pass 2: assigning identities and filtering isolated/scattered ones.
    Identification,
    /// Pass 3: trajectory smoothing and output emission.
    Smoothing,
    /// All done.
    Complete,
}

impl IdentifyStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Discovery => "Discovering candidate identities",
            Self::Identification => "Identifying and filtering",
            Self::Smoothing => "Smoothing and emitting",
            Self::Complete => "Pipeline complete",
        }
    }

    /// Weight of this stage in overall progress (out of 100).
    fn weight(&self) -> f32 {
        match self {
            Self::Discovery => 30.0,
            Self::Identification => 40.0,
            Self::Smoothing => 30.0,
            Self::Complete => 0.0,
        }
    }
}

/// Progress of an `identify` run, reported through a callback so a CLI or
/// any other caller can render a progress bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyProgress {
    pub stage: IdentifyStage,
    /// Overall progress, `0.0` to `1.0`.
    pub overall_progress: f32,
    /// Stage-specific progress, `0.0` to `1.0`.
    pub stage_progress: f32,
    pub message: String,
}

const TOTAL_WEIGHT: f32 = 100.0;

fn report(
    progress: &mut dyn FnMut(IdentifyProgress),
    stage: IdentifyStage,
    completed_weight: f32,
    stage_progress: f32,
    message: impl Into<String>,
) {
    progress(IdentifyProgress {
        stage,
        overall_progress: ((completed_weight + stage_progress * stage.weight()) / TOTAL_WEIGHT)
            .clamp(0.0, 1.0),
        stage_progress,
        message: message.into(),
    });
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: usize,
    pub identities: usize,
}

/// Drives the three passes over a video and its detections, maintaining the
/// identity gallery across all of them.
pub struct Identifier {
    config: Config,
    gallery: ImagesSimilarity,
    next_unk: u64,
}

impl Identifier {
    /// Build an orchestrator with the default (no model file required)
    /// heuristic recognizer.
    pub fn new(config: Config) -> Self {
        Self::with_backend(config, Box::new(HeuristicRecognizer))
    }

    /// Build an orchestrator with a caller-supplied recognizer backend (the
    /// ONNX backend, or a test double).
    pub fn with_backend(config: Config, backend: Box<dyn RecognizerBackend>) -> Self {
        let gallery = ImagesSimilarity::new(
            backend,
            config.compare_coords_min_threshold,
            config.nb_images_recognizer,
        );
        Identifier {
            config,
            gallery,
            next_unk: 0,
        }
    }

    pub fn gallery(&self) -> &ImagesSimilarity {
        &self.gallery
    }

    /// Runs the full pipeline: reads `video_path` and `coords_path`, and
    /// writes per-identity and aggregate streams into `output_dir`.
    pub fn run(
        &mut self,
        video_path: impl AsRef<Path>,
        coords_path: impl AsRef<Path>,
        coords_format: CoordsFormat,
        output_dir: impl AsRef<Path>,
        mut progress: impl FnMut(IdentifyProgress),
    ) -> Result<RunSummary> {
        let video_path = video_path.as_ref();
        let output_dir = output_dir.as_ref();

        let mut reader = VideoReader::open(video_path)?;
        let records = coords_io::read(coords_path.as_ref(), coords_format)?;

        let reported_frames = reader.nframes();
        if reported_frames != i64::MAX && records.len() as i64 != reported_frames {
            return Err(IdentifyError::LengthMismatch {
                coords_frames: records.len(),
                video_frames: reported_frames as usize,
            });
        }

        let nframes = records.len();
        let mut detections: Vec<Vec<Coord>> = vec![Vec::new(); nframes];
        for record in &records {
            if record.frame_index >= nframes {
                return Err(IdentifyError::OutOfRange(format!(
                    "coords file references frame {} beyond {nframes} frames",
                    record.frame_index
                )));
            }
            detections[record.frame_index] = record.coords.clone();
        }

        info!(video = %video_path.display(), frames = nframes, "starting identification run");

        let mut completed_weight = 0.0f32;
        report(&mut progress, IdentifyStage::Discovery, completed_weight, 0.0, "discovering candidate identities");
        self.pass1_discover(&mut reader, &detections, completed_weight, &mut progress)?;
        self.dedup_candidates();
        completed_weight += IdentifyStage::Discovery.weight();

        report(&mut progress, IdentifyStage::Identification, completed_weight, 0.0, "identifying and filtering detections");
        let (final_coords, final_ids) = self.pass2_identify(&mut reader, &detections, completed_weight, &mut progress)?;
        completed_weight += IdentifyStage::Identification.weight();

        report(&mut progress, IdentifyStage::Smoothing, completed_weight, 0.0, "smoothing trajectories and writing output");
        self.pass3_smooth_and_emit(
            &mut reader,
            &final_coords,
            &final_ids,
            coords_format,
            output_dir,
            completed_weight,
            &mut progress,
        )?;
        completed_weight += IdentifyStage::Smoothing.weight();

        report(&mut progress, IdentifyStage::Complete, completed_weight, 1.0, "done");

        Ok(RunSummary {
            frames: nframes,
            identities: self.gallery.len(),
        })
    }

    fn pass1_discover(
        &mut self,
        reader: &mut VideoReader,
        detections: &[Vec<Coord>],
        completed_weight: f32,
        progress: &mut dyn FnMut(IdentifyProgress),
    ) -> Result<()> {
        let width = reader.width();
        let height = reader.height();
        let nframes_hint = reader.nframes();
        let window_size = FrameWindow::recommended_size(width, height, nframes_hint).max(1);
        let total = detections.len().max(1) as f32;

        let mut window = FrameWindow::new(reader, window_size, 0)?;
        while window.next()? {
            let (start, end) = window.get_buffer_range();
            for abs in start..=end {
                let frame = match window.frame(abs) {
                    Some(f) => f,
                    None => continue,
                };
                for coord in &detections[abs as usize] {
                    if coord.confidence() < self.config.face_min_confidence {
                        continue;
                    }
                    let (matched, score) = self.gallery.identify(None, Some(coord))?;
                    match matched {
                        None => {
                            if let Ok(crop) = image_ops::crop(frame, coord) {
                                self.gallery.create_identity(crop, *coord)?;
                            }
                        }
                        Some(id) => {
                            let at_cap = self
                                .gallery
                                .get(&id)
                                .map(|r| r.gallery_len() >= self.config.nb_images_recognizer)
                                .unwrap_or(true);
                            if score > self.config.compare_coords_ref_min_threshold && !at_cap {
                                if let Ok(crop) = image_ops::crop(frame, coord) {
                                    self.gallery.add_image(&id, crop)?;
                                }
                            }
                            self.gallery.update_current_coords(&id, *coord)?;
                        }
                    }
                }
                report(
                    progress,
                    IdentifyStage::Discovery,
                    completed_weight,
                    (abs as f32 / total).min(1.0),
                    format!("discovering identities (frame {abs})"),
                );
            }
        }
        Ok(())
    }

    /// Removes near-duplicate candidate identities (the same face discovered
    /// twice) and identities whose gallery never grew past a third of the
    /// cap, keeping the larger gallery on every collision.
    fn dedup_candidates(&mut self) {
        let ids: Vec<String> = self.gallery.identities().cloned().collect();
        let mut removed: HashSet<String> = HashSet::new();

        for i in 0..ids.len() {
            if removed.contains(&ids[i]) {
                continue;
            }
            for j in (i + 1)..ids.len() {
                if removed.contains(&ids[j]) {
                    continue;
                }
                let (a, b) = (&ids[i], &ids[j]);
                let coords_score = self.gallery.compare_kids_coords(a, b).unwrap_or(0.0);
                let images_score = self.gallery.compare_kids_images(a, b).unwrap_or(0.0);
                if coords_score > self.config.coords_min_dist || images_score > self.config.images_min_dist {
                    let len_a = self.gallery.get(a).map(|r| r.gallery_len()).unwrap_or(0);
                    let len_b = self.gallery.get(b).map(|r| r.gallery_len()).unwrap_or(0);
                    let loser = if len_a < len_b { a.clone() } else { b.clone() };
                    removed.insert(loser);
                }
            }
        }
        for id in &removed {
            self.gallery.remove_identity(id);
        }

        let min_len = (self.config.nb_images_recognizer / 3).max(1);
        let sparse: Vec<String> = self
            .gallery
            .identities()
            .filter(|id| self.gallery.get(id).map(|r| r.gallery_len() < min_len).unwrap_or(false))
            .cloned()
            .collect();
        for id in sparse {
            self.gallery.remove_identity(&id);
        }
    }

    fn pass2_identify(
        &mut self,
        reader: &mut VideoReader,
        detections: &[Vec<Coord>],
        completed_weight: f32,
        progress: &mut dyn FnMut(IdentifyProgress),
    ) -> Result<(Vec<Vec<Coord>>, Vec<Vec<String>>)> {
        self.gallery.train_recognizer();

        let width = reader.width();
        let height = reader.height();
        let nframes_hint = reader.nframes();
        let nframes = detections.len();
        let total = nframes.max(1) as f32;

        let mut final_coords: Vec<Vec<Coord>> = vec![Vec::new(); nframes];
        let mut final_ids: Vec<Vec<String>> = vec![Vec::new(); nframes];

        let window_size = FrameWindow::recommended_size(width, height, nframes_hint).max(3);
        let overlap = 2.min(window_size.saturating_sub(1));

        reader.seek_to_frame(0)?;
        let mut window = FrameWindow::new(reader, window_size, overlap)?;

        while window.next()? {
            let (start, end) = window.get_buffer_range();
            let w_len = (end - start + 1) as usize;

            let mut buf = IdCoordsBuffer::new(w_len);
            for rel in 0..w_len {
                let abs = start as usize + rel;
                buf.set_coordinates(rel, detections[abs].clone())?;
            }

            for rel in 0..w_len {
                let abs = start + rel as i64;
                let frame = window.frame(abs);
                let coords = buf.coords(rel)?.to_vec();
                let mut claims: Vec<(usize, String, f32)> = Vec::new();

                for (face_idx, coord) in coords.iter().enumerate() {
                    let cropped = frame.and_then(|f| image_ops::crop(f, coord).ok());
                    let mut result = match &cropped {
                        Some(crop) => self.gallery.identify(Some(crop), None)?,
                        None => (None, 0.0),
                    };
                    if result.0.is_none() {
                        result = self.gallery.identify(None, Some(coord))?;
                    }
                    match result.0 {
                        Some(id) => claims.push((face_idx, id, result.1)),
                        None => buf.set_id(rel, face_idx, "unknown")?,
                    }
                }

                let mut best_for_id: HashMap<String, (usize, f32)> = HashMap::new();
                for (face_idx, id, score) in &claims {
                    let better = best_for_id
                        .get(id)
                        .map(|(_, best_score)| *score > *best_score)
                        .unwrap_or(true);
                    if better {
                        best_for_id.insert(id.clone(), (*face_idx, *score));
                    }
                }
                for (face_idx, id, _score) in &claims {
                    let is_winner = best_for_id
                        .get(id)
                        .map(|(winner_idx, _)| *winner_idx == *face_idx)
                        .unwrap_or(false);
                    if is_winner {
                        buf.set_id(rel, *face_idx, id.clone())?;
                        self.gallery.update_current_coords(id, coords[*face_idx])?;
                    } else {
                        buf.set_id(rel, *face_idx, "unknown")?;
                    }
                }
            }

            Self::dissociate_or_fill(&mut buf, &mut self.next_unk)?;
            Self::remove_scattered(&mut buf, &mut self.next_unk)?;
            Self::drop_unknowns(&mut buf)?;

            for rel in 0..w_len {
                let abs = start as usize + rel;
                final_coords[abs] = buf.coords(rel)?.to_vec();
                final_ids[abs] = buf.ids(rel)?.to_vec();
            }

            report(
                progress,
                IdentifyStage::Identification,
                completed_weight,
                (end as f32 / total).min(1.0),
                format!("identifying detections (frame {end})"),
            );
        }

        Ok((final_coords, final_ids))
    }

    fn face_index(buffer: &IdCoordsBuffer, frame: usize, id: &str) -> Result<Option<usize>> {
        Ok(buffer.ids(frame)?.iter().position(|existing| existing == id))
    }

    /// Within a 3-frame run `(present, absent, present)` for the same
    /// identity, fills the gap with the midpoint rectangle when the two
    /// endpoints are similar enough to plausibly be the same detection
    /// flickering; a `(absent, present, absent)` run is treated as an
    /// isolated false positive and dissociated to a unique sentinel id.
    ///
    /// The three-flag state (`here[0..3]`) is rolled forward one position
    /// per iteration and captured from the buffer only once per position,
    /// before any fill/dissociate happens there: a fill performed at `i-1`
    /// is not retroactively visible as "present" two iterations later, only
    /// an explicit dissociation overrides the flag already carried forward.
    fn dissociate_or_fill(buffer: &mut IdCoordsBuffer, next_unk: &mut u64) -> Result<()> {
        let window_size = buffer.len();
        if window_size < 3 {
            return Ok(());
        }
        let ids = buffer.distinct_ids();
        for id in &ids {
            if id.starts_with("unk") {
                continue;
            }
            let mut here = [
                buffer.has_id(0, id)?,
                buffer.has_id(1, id)?,
                false,
            ];
            let mut i = 2;
            while i < window_size {
                here[2] = buffer.has_id(i, id)?;
                let (p2, p1, p0) = (here[0], here[1], here[2]);

                if p2 && !p1 && p0 {
                    let c2 = buffer.get_id_coordinate(i - 2, id)?;
                    let c0 = buffer.get_id_coordinate(i, id)?;
                    if let (Some(c2), Some(c0)) = (c2, c0) {
                        if coords_similarity(&c2, &c0) > 0.5 {
                            let mid = c2.intermediate(&c0)?;
                            let idx = buffer.append_coordinate(i - 1, mid)?;
                            buffer.set_id(i - 1, idx, id.clone())?;
                        }
                    }
                } else if !p2 && p1 && !p0 {
                    if let Some(face_idx) = Self::face_index(buffer, i - 1, id)? {
                        *next_unk += 1;
                        buffer.set_id(i - 1, face_idx, format!("unk_{next_unk}"))?;
                        here[1] = false;
                    }
                }

                here[0] = here[1];
                here[1] = here[2];
                i += 1;
            }
        }
        Ok(())
    }

    /// Dissociates identities that are both rare (present in under 15% of
    /// the window) and scattered (fewer than one sustained four-frame run
    /// per roughly four window-positions), rather than continuously
    /// present for a short stretch.
    fn remove_scattered(buffer: &mut IdCoordsBuffer, next_unk: &mut u64) -> Result<()> {
        let window_size = buffer.len();
        if window_size == 0 {
            return Ok(());
        }
        let ids = buffer.distinct_ids();
        for id in &ids {
            if id.starts_with("unk") {
                continue;
            }
            let mut presence = Vec::with_capacity(window_size);
            for i in 0..window_size {
                presence.push(buffer.has_id(i, id)?);
            }
            let present_count = presence.iter().filter(|p| **p).count();
            let presence_ratio = 100.0 * present_count as f64 / window_size as f64;
            if presence_ratio >= 15.0 {
                continue;
            }

            let n = 4usize;
            let counts = symbols_to_items(&presence, n);
            let sustained_runs = counts.get(&vec![true; n]).copied().unwrap_or(0);
            let denominator = window_size.saturating_sub(n).saturating_sub(1);

            if sustained_runs == 0
                || (denominator > 0 && (sustained_runs as f64) / (denominator as f64) < 0.25)
            {
                for i in 0..window_size {
                    if let Some(face_idx) = Self::face_index(buffer, i, id)? {
                        *next_unk += 1;
                        buffer.set_id(i, face_idx, format!("unk_{next_unk}"))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Removes every detection whose identity starts with `unk` (both the
    /// `"unknown"` label and the `unk_N` sentinels dissociation assigns).
    /// Idempotent: a second pass finds nothing left to drop.
    fn drop_unknowns(buffer: &mut IdCoordsBuffer) -> Result<()> {
        for i in 0..buffer.len() {
            let ids = buffer.ids(i)?.to_vec();
            for (idx, id) in ids.iter().enumerate().rev() {
                if id.starts_with("unk") {
                    buffer.pop_coordinate(i, idx)?;
                }
            }
        }
        Ok(())
    }

    /// Fits an independent linear regression to the x- and y-history and
    /// evaluates both at the last history index; width/height are the plain
    /// mean of their own history. `None` until at least 3 points are held.
    fn predict(history: &VecDeque<(f64, f64, f64, f64)>) -> Option<(f64, f64, f64, f64)> {
        if history.len() < 3 {
            return None;
        }
        let xs: Vec<(f64, f64)> = history.iter().enumerate().map(|(i, p)| (i as f64, p.0)).collect();
        let ys: Vec<(f64, f64)> = history.iter().enumerate().map(|(i, p)| (i as f64, p.1)).collect();
        let (ax, bx) = linear_regression(&xs).ok()?;
        let (ay, by) = linear_regression(&ys).ok()?;
        let last = (history.len() - 1) as f64;
        let x = linear_fct(ax, bx, last);
        let y = linear_fct(ay, by, last);
        let w = fmean(&history.iter().map(|p| p.2).collect::<Vec<_>>());
        let h = fmean(&history.iter().map(|p| p.3).collect::<Vec<_>>());
        Some((x, y, w, h))
    }

    #[allow(clippy::too_many_arguments)]
    fn pass3_smooth_and_emit(
        &mut self,
        reader: &mut VideoReader,
        coords: &[Vec<Coord>],
        ids: &[Vec<String>],
        coords_format: CoordsFormat,
        output_dir: &Path,
        completed_weight: f32,
        progress: &mut dyn FnMut(IdentifyProgress),
    ) -> Result<()> {
        let fps = reader.fps();
        let width = reader.width();
        let height = reader.height();
        let nframes = coords.len();
        let total = nframes.max(1) as f32;
        let window_size = ((fps * self.config.pass3_window_seconds).round() as usize).max(3);
        let history_cap = window_size.saturating_sub(1).max(1);

        reader.seek_to_frame(0)?;
        let mut window = FrameWindow::new(reader, window_size, 0)?;

        let mut sinks = OutputSinks::new(
            output_dir,
            coords_format,
            fps,
            (width, height),
            (self.config.out_width, self.config.out_height),
            self.config.out_aggregate,
        )?;

        let mut previous_window: Vec<(Vec<Coord>, Vec<String>)> = Vec::new();
        let mut buffer_number = 0usize;

        while window.next()? {
            let (start, end) = window.get_buffer_range();
            let w_len = (end - start + 1) as usize;

            let mut histories: HashMap<String, VecDeque<(f64, f64, f64, f64)>> = HashMap::new();
            for (frame_coords, frame_ids) in &previous_window {
                for (c, id) in frame_coords.iter().zip(frame_ids.iter()) {
                    let history = histories.entry(id.clone()).or_default();
                    history.push_back((c.x() as f64, c.y() as f64, c.w() as f64, c.h() as f64));
                    if history.len() > history_cap {
                        history.pop_front();
                    }
                }
            }

            let mut window_coords: Vec<Vec<Coord>> =
                (0..w_len).map(|rel| coords[start as usize + rel].clone()).collect();
            let mut window_ids: Vec<Vec<String>> =
                (0..w_len).map(|rel| ids[start as usize + rel].clone()).collect();

            let mut distinct_ids: Vec<String> = Vec::new();
            for frame_ids in &window_ids {
                for id in frame_ids {
                    if !distinct_ids.contains(id) {
                        distinct_ids.push(id.clone());
                    }
                }
            }

            for id in &distinct_ids {
                let mut history = histories.remove(id).unwrap_or_default();
                for rel in 0..w_len {
                    let face_idx = window_ids[rel].iter().position(|x| x == id);
                    if let Some(idx) = face_idx {
                        let c = window_coords[rel][idx];
                        history.push_back((c.x() as f64, c.y() as f64, c.w() as f64, c.h() as f64));
                        if history.len() > history_cap {
                            history.pop_front();
                        }
                    }

                    if let Some((x, y, w, h)) = Self::predict(&history) {
                        let x = x.max(0.0);
                        let y = y.max(0.0);
                        let w = w.max(0.0);
                        let h = h.max(0.0);
                        if let Some(idx) = face_idx {
                            let confidence = window_coords[rel][idx].confidence();
                            if let Ok(smoothed) = Coord::with_score(x as i64, y as i64, w as i64, h as i64, confidence) {
                                window_coords[rel][idx] = smoothed;
                            }
                        } else if let Ok(inserted) = Coord::with_score(x as i64, y as i64, w as i64, h as i64, 0.0) {
                            window_coords[rel].push(inserted);
                            window_ids[rel].push(id.clone());
                        }
                    }
                }
            }

            for rel in 0..w_len {
                let abs = start + rel as i64;
                let frame = match window.frame(abs) {
                    Some(f) => f,
                    None => continue,
                };

                if self.config.out_aggregate {
                    let rgb = frame_buffer_to_rgb24(frame);
                    sinks.write_aggregate(abs as usize, buffer_number, &rgb, &window_coords[rel], &window_ids[rel])?;
                }

                if self.config.out_ident {
                    for (idx, id) in window_ids[rel].iter().enumerate() {
                        let face = window_coords[rel][idx];
                        let portrait = if self.config.out_selfie {
                            face.selfie(Some((width, height)))
                        } else {
                            face.default_portrait(Some((width, height)))
                        };
                        let mut portrait = match portrait {
                            Ok(p) => p,
                            Err(e) => {
                                warn!(error = %e, id, "skipping unreachable portrait crop");
                                continue;
                            }
                        };
                        if self.config.out_shift != 0.0 {
                            let shift_x = (portrait.w() as f64 * (self.config.out_shift as f64 / 100.0)) as i64;
                            let _ = portrait.shift(shift_x, 0, Some((width, height)));
                        }

                        let (canvas, _) = per_identity::crop_portrait(
                            frame,
                            &face,
                            &portrait,
                            (self.config.out_width, self.config.out_height),
                        );
                        let rgb = frame_buffer_to_rgb24(&canvas);
                        sinks.write_identity(id, abs as usize, buffer_number, &rgb, &face)?;
                    }
                }
            }

            previous_window = (0..w_len)
                .skip(w_len.saturating_sub(history_cap))
                .map(|rel| (window_coords[rel].clone(), window_ids[rel].clone()))
                .collect();
            buffer_number += 1;

            report(
                progress,
                IdentifyStage::Smoothing,
                completed_weight,
                (end as f32 / total).min(1.0),
                format!("smoothing and emitting (frame {end})"),
            );
        }

        sinks.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i64, y: i64) -> Coord {
        Coord::with_score(x, y, 20, 20, 0.9).unwrap()
    }

    #[test]
    fn dissociate_or_fill_inserts_midpoint_in_a_gap() {
        let mut buf = IdCoordsBuffer::new(3);
        buf.set_coordinates(0, vec![c(0, 0)]).unwrap();
        buf.set_id(0, 0, "alice").unwrap();
        buf.set_coordinates(1, vec![]).unwrap();
        buf.set_coordinates(2, vec![c(4, 4)]).unwrap();
        buf.set_id(2, 0, "alice").unwrap();

        let mut next_unk = 0u64;
        Identifier::dissociate_or_fill(&mut buf, &mut next_unk).unwrap();

        assert!(buf.has_id(1, "alice").unwrap());
    }

    #[test]
    fn dissociate_or_fill_isolates_a_single_frame_blip() {
        let mut buf = IdCoordsBuffer::new(3);
        buf.set_coordinates(0, vec![]).unwrap();
        buf.set_coordinates(1, vec![c(0, 0)]).unwrap();
        buf.set_id(1, 0, "ghost").unwrap();
        buf.set_coordinates(2, vec![]).unwrap();

        let mut next_unk = 0u64;
        Identifier::dissociate_or_fill(&mut buf, &mut next_unk).unwrap();

        assert!(!buf.has_id(1, "ghost").unwrap());
        assert_eq!(next_unk, 1);
    }

    #[test]
    fn drop_unknowns_removes_unknown_and_sentinel_ids() {
        let mut buf = IdCoordsBuffer::new(1);
        buf.set_coordinates(0, vec![c(0, 0), c(10, 10)]).unwrap();
        buf.set_id(0, 0, "unknown").unwrap();
        buf.set_id(0, 1, "unk_7").unwrap();

        Identifier::drop_unknowns(&mut buf).unwrap();
        assert!(buf.coords(0).unwrap().is_empty());
    }

    #[test]
    fn drop_unknowns_is_idempotent() {
        let mut buf = IdCoordsBuffer::new(1);
        buf.set_coordinates(0, vec![c(0, 0)]).unwrap();
        buf.set_id(0, 0, "alice").unwrap();

        Identifier::drop_unknowns(&mut buf).unwrap();
        let after_first = buf.coords(0).unwrap().to_vec();
        Identifier::drop_unknowns(&mut buf).unwrap();
        assert_eq!(buf.coords(0).unwrap(), after_first.as_slice());
    }

    #[test]
    fn remove_scattered_dissociates_rare_isolated_hits() {
        let mut buf = IdCoordsBuffer::new(40);
        for i in 0..40 {
            if i % 10 == 0 {
                buf.set_coordinates(i, vec![c(0, 0)]).unwrap();
                buf.set_id(i, 0, "flicker").unwrap();
            } else {
                buf.set_coordinates(i, vec![]).unwrap();
            }
        }
        let mut next_unk = 0u64;
        Identifier::remove_scattered(&mut buf, &mut next_unk).unwrap();
        assert!(next_unk > 0);
    }

    #[test]
    fn predict_needs_at_least_three_points() {
        let mut history = VecDeque::new();
        history.push_back((0.0, 0.0, 10.0, 10.0));
        history.push_back((1.0, 1.0, 10.0, 10.0));
        assert!(Identifier::predict(&history).is_none());

        history.push_back((2.0, 2.0, 10.0, 10.0));
        let (x, y, w, h) = Identifier::predict(&history).unwrap();
        assert!((x - 2.0).abs() < 1e-6);
        assert!((y - 2.0).abs() < 1e-6);
        assert!((w - 10.0).abs() < 1e-6);
        assert!((h - 10.0).abs() < 1e-6);
    }

    #[test]
    fn dedup_candidates_keeps_the_larger_gallery() {
        let config = Config::default();
        let mut identifier = Identifier::new(config);
        let frame = vidid_core::frame::FrameBuffer::test_pattern(64, 64);

        let a = identifier
            .gallery
            .create_identity(frame.clone(), Coord::new(0, 0, 40, 40).unwrap())
            .unwrap();
        let b = identifier
            .gallery
            .create_identity(frame.clone(), Coord::new(2, 2, 40, 40).unwrap())
            .unwrap();
        identifier.gallery.add_image(&b, frame).unwrap();

        identifier.dedup_candidates();
        assert!(identifier.gallery.contains(&b));
        assert!(!identifier.gallery.contains(&a));
    }
}
