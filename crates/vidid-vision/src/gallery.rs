//! Per-identity gallery ("ImagesSimilarity") and the identification queries
//! the orchestrator runs against it.

use std::collections::HashMap;

use vidid_core::frame::FrameBuffer;
use vidid_core::Coord;

use crate::error::{Result, VisionError};
use crate::recognizer::{cosine_similarity, RecognizerBackend};

/// Everything known about one identity: its frozen reference crop, the
/// coordinates it was last seen at, and a bounded gallery of additional
/// crops used for image-based recognition.
pub struct IdentityRecord {
    reference_image: FrameBuffer,
    reference_coords: Coord,
    current_coords: Coord,
    images: Vec<FrameBuffer>,
    embeddings: Vec<Vec<f32>>,
}

impl IdentityRecord {
    fn new(reference_image: FrameBuffer, reference_coords: Coord, reference_embedding: Vec<f32>) -> Self {
        IdentityRecord {
            current_coords: reference_coords,
            reference_image,
            reference_coords,
            images: Vec::new(),
            embeddings: vec![reference_embedding],
        }
    }

    pub fn reference_image(&self) -> &FrameBuffer {
        &self.reference_image
    }

    pub fn reference_coords(&self) -> &Coord {
        &self.reference_coords
    }

    pub fn current_coords(&self) -> &Coord {
        &self.current_coords
    }

    /// Number of crops held for this identity, reference image included.
    pub fn gallery_len(&self) -> usize {
        self.images.len() + 1
    }
}

/// Rectangle-similarity measure used when identifying by coordinates: a
/// monotone blend of overlap percentage and center-distance, in `[0, 1]`.
/// Exposed so the orchestrator can apply the same measure outside of
/// `identify`/`compare_kids_coords` (the pass-2 trigram gap-fill check).
pub fn coords_similarity(a: &Coord, b: &Coord) -> f32 {
    let (pct_of_b, pct_of_a) = a.overlap(b);
    let overlap_score = ((pct_of_a + pct_of_b) / 2.0 / 100.0) as f32;

    let dist = a.euclidian_distance(b) as f64;
    let diag = (((a.w() * a.w() + a.h() * a.h()) as f64).sqrt()).max(1.0);
    let dist_score = (1.0 - dist / diag).max(0.0) as f32;

    (0.7 * overlap_score + 0.3 * dist_score).clamp(0.0, 1.0)
}

/// Per-identity image/coordinate gallery, the pluggable identification
/// primitive the three-pass orchestrator drives.
pub struct ImagesSimilarity {
    backend: Box<dyn RecognizerBackend>,
    score_level: f32,
    nb_fr_img: usize,
    identities: HashMap<String, IdentityRecord>,
    next_id: u64,
    trained: bool,
}

impl ImagesSimilarity {
    /// Create a new gallery. `score_level` is the minimum similarity score
    /// to accept a match; `nb_fr_img` is the per-identity gallery cap
    /// (`NUMBER_OF_FACE_KID_IMAGES`, 20 by default). The recognizer backend
    /// is fixed for the gallery's lifetime.
    pub fn new(backend: Box<dyn RecognizerBackend>, score_level: f32, nb_fr_img: usize) -> Self {
        ImagesSimilarity {
            backend,
            score_level,
            nb_fr_img,
            identities: HashMap::new(),
            next_id: 1,
            trained: false,
        }
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.identities.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&IdentityRecord> {
        self.identities.get(id)
    }

    pub fn identities(&self) -> impl Iterator<Item = &String> {
        self.identities.keys()
    }

    /// Create a new identity from a reference crop, returning its opaque
    /// identifier.
    pub fn create_identity(&mut self, reference_image: FrameBuffer, reference_coords: Coord) -> Result<String> {
        let embedding = self.backend.embed(&reference_image)?;
        let id = self.next_id.to_string();
        self.next_id += 1;
        self.identities.insert(
            id.clone(),
            IdentityRecord::new(reference_image, reference_coords, embedding),
        );
        Ok(id)
    }

    /// Append a new crop to an identity's gallery, if it hasn't reached
    /// `nb_fr_img` yet. No-op (not an error) once the cap is reached.
    pub fn add_image(&mut self, id: &str, image: FrameBuffer) -> Result<()> {
        let embedding = self.backend.embed(&image)?;
        let record = self
            .identities
            .get_mut(id)
            .ok_or_else(|| VisionError::NotFound(id.to_string()))?;
        if record.images.len() + 1 < self.nb_fr_img {
            record.images.push(image);
            record.embeddings.push(embedding);
        }
        Ok(())
    }

    pub fn update_current_coords(&mut self, id: &str, coords: Coord) -> Result<()> {
        let record = self
            .identities
            .get_mut(id)
            .ok_or_else(|| VisionError::NotFound(id.to_string()))?;
        record.current_coords = coords;
        Ok(())
    }

    pub fn remove_identity(&mut self, id: &str) -> Option<IdentityRecord> {
        self.identities.remove(id)
    }

    /// Freeze the current gallery as the training set. With the heuristic
    /// backend this is a no-op beyond bookkeeping (every crop is already
    /// embedded as it's added); an ONNX backend could use this hook to
    /// recompute per-identity centroid embeddings.
    pub fn train_recognizer(&mut self) {
        self.trained = true;
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// `identify(img?, coords?) -> (id?, score)`. Coords take priority when
    /// both are given, matching the orchestrator's pass-2 "coords first,
    /// image as rescue" rule.
    pub fn identify(&self, img: Option<&FrameBuffer>, coords: Option<&Coord>) -> Result<(Option<String>, f32)> {
        if let Some(c) = coords {
            return Ok(self.identify_by_coords(c));
        }
        if let Some(image) = img {
            return self.identify_by_image(image);
        }
        Ok((None, 0.0))
    }

    fn identify_by_coords(&self, coords: &Coord) -> (Option<String>, f32) {
        let mut best: Option<(&str, f32)> = None;
        for (id, record) in &self.identities {
            let score = coords_similarity(coords, &record.current_coords);
            if best.map(|(_, b)| score > b).unwrap_or(true) {
                best = Some((id, score));
            }
        }
        match best {
            Some((id, score)) if score > self.score_level => (Some(id.to_string()), score),
            Some((_, score)) => (None, score),
            None => (None, 0.0),
        }
    }

    fn identify_by_image(&self, image: &FrameBuffer) -> Result<(Option<String>, f32)> {
        let embedding = self.backend.embed(image)?;
        let mut best: Option<(&str, f32)> = None;
        for (id, record) in &self.identities {
            let score = best_embedding_score(&embedding, &record.embeddings);
            if best.map(|(_, b)| score > b).unwrap_or(true) {
                best = Some((id, score));
            }
        }
        Ok(match best {
            Some((id, score)) if score > self.score_level => (Some(id.to_string()), score),
            Some((_, score)) => (None, score),
            None => (None, 0.0),
        })
    }

    /// Symmetric rectangle-similarity score between two identities' current
    /// positions.
    pub fn compare_kids_coords(&self, a: &str, b: &str) -> Result<f32> {
        let ra = self.identities.get(a).ok_or_else(|| VisionError::NotFound(a.to_string()))?;
        let rb = self.identities.get(b).ok_or_else(|| VisionError::NotFound(b.to_string()))?;
        Ok(coords_similarity(&ra.current_coords, &rb.current_coords))
    }

    /// Symmetric image-similarity score between two identities' galleries
    /// (best pairwise embedding match).
    pub fn compare_kids_images(&self, a: &str, b: &str) -> Result<f32> {
        let ra = self.identities.get(a).ok_or_else(|| VisionError::NotFound(a.to_string()))?;
        let rb = self.identities.get(b).ok_or_else(|| VisionError::NotFound(b.to_string()))?;
        let mut best = 0.0f32;
        for ea in &ra.embeddings {
            for eb in &rb.embeddings {
                let score = cosine_similarity(ea, eb);
                if score > best {
                    best = score;
                }
            }
        }
        Ok(best)
    }
}

fn best_embedding_score(embedding: &[f32], gallery: &[Vec<f32>]) -> f32 {
    gallery
        .iter()
        .map(|e| cosine_similarity(embedding, e))
        .fold(0.0f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::HeuristicRecognizer;
    use vidid_core::frame::PixelFormat;

    fn solid_frame(rgb: (u8, u8, u8)) -> FrameBuffer {
        let mut frame = FrameBuffer::new(32, 32, PixelFormat::Rgba8);
        let plane = frame.primary_plane_mut();
        for y in 0..32 {
            let row = plane.row_mut(y);
            for x in 0..32 {
                let i = (x * 4) as usize;
                row[i] = rgb.0;
                row[i + 1] = rgb.1;
                row[i + 2] = rgb.2;
                row[i + 3] = 255;
            }
        }
        frame
    }

    fn gallery() -> ImagesSimilarity {
        ImagesSimilarity::new(Box::new(HeuristicRecognizer), 0.6, 20)
    }

    #[test]
    fn create_and_identify_by_coords() {
        let mut g = gallery();
        let coords = Coord::with_score(100, 100, 80, 80, 0.95).unwrap();
        let id = g.create_identity(solid_frame((200, 50, 50)), coords).unwrap();

        let query = Coord::with_score(102, 101, 80, 80, 0.9).unwrap();
        let (found, score) = g.identify(None, Some(&query)).unwrap();
        assert_eq!(found.as_deref(), Some(id.as_str()));
        assert!(score > 0.6);
    }

    #[test]
    fn identify_by_coords_rejects_far_rectangle() {
        let mut g = gallery();
        let coords = Coord::with_score(0, 0, 40, 40, 0.95).unwrap();
        g.create_identity(solid_frame((200, 50, 50)), coords).unwrap();

        let query = Coord::with_score(900, 900, 40, 40, 0.9).unwrap();
        let (found, _) = g.identify(None, Some(&query)).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn identify_by_image_prefers_closer_match() {
        let mut g = gallery();
        let red_coords = Coord::new(0, 0, 10, 10).unwrap();
        let blue_coords = Coord::new(100, 100, 10, 10).unwrap();
        let red_id = g.create_identity(solid_frame((255, 0, 0)), red_coords).unwrap();
        let _blue_id = g.create_identity(solid_frame((0, 0, 255)), blue_coords).unwrap();

        let (found, _) = g.identify(Some(&solid_frame((250, 10, 10))), None).unwrap();
        assert_eq!(found.as_deref(), Some(red_id.as_str()));
    }

    #[test]
    fn compare_kids_coords_is_symmetric() {
        let mut g = gallery();
        let a = g
            .create_identity(solid_frame((10, 10, 10)), Coord::new(0, 0, 50, 50).unwrap())
            .unwrap();
        let b = g
            .create_identity(solid_frame((200, 200, 200)), Coord::new(10, 10, 50, 50).unwrap())
            .unwrap();
        assert_eq!(
            g.compare_kids_coords(&a, &b).unwrap(),
            g.compare_kids_coords(&b, &a).unwrap()
        );
    }

    #[test]
    fn add_image_respects_gallery_cap() {
        let mut g = gallery();
        let id = g
            .create_identity(solid_frame((1, 2, 3)), Coord::new(0, 0, 10, 10).unwrap())
            .unwrap();
        for _ in 0..25 {
            g.add_image(&id, solid_frame((4, 5, 6))).unwrap();
        }
        assert_eq!(g.get(&id).unwrap().gallery_len(), 20);
    }
}
