//! Pluggable identity-recognition backends.
//!
//! A CPU-fallback / ONNX-opt-in split: [`HeuristicRecognizer`] needs no
//! model file and is the default everywhere, [`OnnxRecognizer`] is only
//! compiled with the `onnx` feature and loads a face-embedding model through
//! [`crate::session::OnnxSession`]. The backend is selected once, at
//! [`crate::gallery::ImagesSimilarity::new`].

use vidid_core::frame::FrameBuffer;
use vidid_core::image_ops;

use crate::error::Result;

/// Side length (in pixels) of the downsampled grayscale crop the heuristic
/// backend embeds faces into.
const HEURISTIC_EMBED_SIZE: u32 = 16;

/// A face-embedding backend: turns a cropped face image into a fixed-length
/// feature vector that can be compared by cosine similarity.
pub trait RecognizerBackend: Send + Sync {
    /// Compute an embedding vector for a cropped face image.
    fn embed(&self, crop: &FrameBuffer) -> Result<Vec<f32>>;

    /// A human-readable name for logging/diagnostics.
    fn name(&self) -> &'static str;
}

/// Cosine similarity between two equal-length vectors, clamped to `[0, 1]`.
/// Negative cosine similarity (opposite vectors) is folded to 0 since the
/// gallery only deals in "how alike", never "how opposite".
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).max(0.0).min(1.0)
}

/// Default recognizer: downsamples a cropped face to a `16x16` grayscale
/// intensity vector and compares embeddings by cosine similarity. No model
/// download required, deterministic, and always available.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicRecognizer;

impl RecognizerBackend for HeuristicRecognizer {
    fn embed(&self, crop: &FrameBuffer) -> Result<Vec<f32>> {
        let mut small = image_ops::resize(crop, HEURISTIC_EMBED_SIZE, HEURISTIC_EMBED_SIZE)?;
        image_ops::grayscale(&mut small)?;

        let plane = small.primary_plane();
        let mut embedding = Vec::with_capacity((HEURISTIC_EMBED_SIZE * HEURISTIC_EMBED_SIZE) as usize);
        for y in 0..small.height {
            let row = plane.row(y);
            for x in 0..small.width {
                let i = (x * 4) as usize;
                embedding.push(row[i] as f32 / 255.0);
            }
        }
        Ok(embedding)
    }

    fn name(&self) -> &'static str {
        "heuristic-grayscale"
    }
}

/// Face-embedding recognizer backed by an ONNX model, loaded once through
/// [`crate::model_manager::ModelManager`] and [`crate::session::OnnxSession`].
#[cfg(feature = "onnx")]
pub struct OnnxRecognizer {
    session: crate::session::OnnxSession,
    input_size: u32,
}

#[cfg(feature = "onnx")]
impl OnnxRecognizer {
    /// Load the face-embedding model from the manager's cache directory.
    /// Fails with [`crate::error::VisionError::ModelNotFound`] if the model
    /// file hasn't been placed there, exactly as `ModelManager::ensure_model`
    /// does for every other model-backed feature in this lineage.
    pub fn load(manager: &crate::model_manager::ModelManager) -> Result<Self> {
        let model_id = crate::model_manager::ModelId::FaceEmbedding;
        let model_path = manager.ensure_model(model_id)?;
        let session = crate::session::OnnxSession::load(&model_path, model_id)?;
        Ok(Self {
            session,
            input_size: 112,
        })
    }
}

#[cfg(feature = "onnx")]
impl RecognizerBackend for OnnxRecognizer {
    fn embed(&self, crop: &FrameBuffer) -> Result<Vec<f32>> {
        use ndarray::Array4;

        let resized = image_ops::resize(crop, self.input_size, self.input_size)?;
        let plane = resized.primary_plane();

        let mut chw = Array4::<f32>::zeros((1, 3, self.input_size as usize, self.input_size as usize));
        for y in 0..resized.height {
            let row = plane.row(y);
            for x in 0..resized.width {
                let i = (x * 4) as usize;
                let (r, g, b) = (row[i] as f32, row[i + 1] as f32, row[i + 2] as f32);
                chw[[0, 0, y as usize, x as usize]] = r / 255.0;
                chw[[0, 1, y as usize, x as usize]] = g / 255.0;
                chw[[0, 2, y as usize, x as usize]] = b / 255.0;
            }
        }

        let outputs = self
            .session
            .inner()
            .run(ort::inputs![chw.view()].map_err(crate::error::VisionError::from)?)
            .map_err(crate::error::VisionError::from)?;
        let (_, embedding) = outputs[0]
            .try_extract_raw_tensor::<f32>()
            .map_err(crate::error::VisionError::from)?;
        Ok(embedding.to_vec())
    }

    fn name(&self) -> &'static str {
        "onnx-face-embedding"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidid_core::frame::{FrameBuffer, PixelFormat};

    fn solid_frame(width: u32, height: u32, rgb: (u8, u8, u8)) -> FrameBuffer {
        let mut frame = FrameBuffer::new(width, height, PixelFormat::Rgba8);
        let plane = frame.primary_plane_mut();
        for y in 0..height {
            let row = plane.row_mut(y);
            for x in 0..width {
                let i = (x * 4) as usize;
                row[i] = rgb.0;
                row[i + 1] = rgb.1;
                row[i + 2] = rgb.2;
                row[i + 3] = 255;
            }
        }
        frame
    }

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![0.3, 0.1, 0.9, 0.4];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn heuristic_recognizer_same_solid_color_crops_match() {
        let recognizer = HeuristicRecognizer;
        let a = solid_frame(64, 64, (200, 40, 40));
        let b = solid_frame(64, 64, (200, 40, 40));
        let ea = recognizer.embed(&a).unwrap();
        let eb = recognizer.embed(&b).unwrap();
        assert!(cosine_similarity(&ea, &eb) > 0.999);
    }

    #[test]
    fn heuristic_recognizer_different_crops_differ() {
        let recognizer = HeuristicRecognizer;
        let a = solid_frame(64, 64, (255, 255, 255));
        let b = solid_frame(64, 64, (0, 0, 0));
        let ea = recognizer.embed(&a).unwrap();
        let eb = recognizer.embed(&b).unwrap();
        // Both embeddings are constant vectors (all-1 vs all-0); cosine
        // similarity against an all-zero vector is defined as 0 here.
        assert!(cosine_similarity(&ea, &eb) < 0.5);
    }
}
