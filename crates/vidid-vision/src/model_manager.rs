//! Model cache manager for the ONNX face-embedding recognizer.
//!
//! Manages the on-disk cache of the recognizer's ONNX model file: checking
//! whether it's present, and locating it by path. Downloading is out of
//! scope until model hosting is set up, mirroring the teacher's ai crate.

use crate::error::{Result, VisionError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Specification for a model file.
pub struct ModelSpec {
    /// Unique identifier.
    pub id: ModelId,
    /// Filename in the cache directory.
    pub filename: &'static str,
    /// Download URL (placeholder until models are hosted).
    pub url: &'static str,
    /// Expected size in bytes.
    pub size_bytes: u64,
}

/// Identifies a cacheable model. Currently a single face-embedding model;
/// kept as an enum so additional embedding models can be added without
/// changing the cache API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    /// Face-embedding model used by [`crate::recognizer::OnnxRecognizer`].
    FaceEmbedding,
}

impl ModelId {
    /// Get the specification for this model.
    pub fn spec(&self) -> ModelSpec {
        match self {
            Self::FaceEmbedding => ModelSpec {
                id: *self,
                filename: "face_embedding.onnx",
                url: "https://huggingface.co/vidid/models/resolve/main/face_embedding.onnx",
                size_bytes: 90_000_000,
            },
        }
    }

    /// Human-readable model size.
    pub fn size_human(&self) -> &'static str {
        match self {
            Self::FaceEmbedding => "90 MB",
        }
    }
}

/// Manages the face-embedding model's on-disk cache.
pub struct ModelManager {
    cache_dir: PathBuf,
}

impl ModelManager {
    /// Create a new model manager with the given cache directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Returns the path to the cached model, or a [`VisionError::ModelNotFound`]
    /// if it hasn't been placed in the cache directory yet.
    pub fn ensure_model(&self, model: ModelId) -> Result<PathBuf> {
        let spec = model.spec();
        let local_path = self.cache_dir.join(spec.filename);

        if local_path.exists() {
            info!(model = ?model, path = %local_path.display(), "model already cached");
            return Ok(local_path);
        }

        std::fs::create_dir_all(&self.cache_dir)?;

        info!(model = ?model, url = spec.url, "model not cached, download required");
        Err(VisionError::ModelNotFound {
            model_id: format!("{:?}", model),
        })
    }

    /// Check if a model is already cached locally.
    pub fn is_cached(&self, model: ModelId) -> bool {
        let spec = model.spec();
        self.cache_dir.join(spec.filename).exists()
    }

    /// Get the local path for a model (may not exist yet).
    pub fn model_path(&self, model: ModelId) -> PathBuf {
        let spec = model.spec();
        self.cache_dir.join(spec.filename)
    }

    /// Get the cache directory path.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_spec_defined() {
        let spec = ModelId::FaceEmbedding.spec();
        assert!(!spec.filename.is_empty());
        assert!(!spec.url.is_empty());
        assert!(spec.size_bytes > 0);
    }

    #[test]
    fn test_model_manager_cache_dir() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let mgr = ModelManager::new(tmp.path());
        assert!(!mgr.is_cached(ModelId::FaceEmbedding));
    }

    #[test]
    fn test_model_path_construction() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let mgr = ModelManager::new(tmp.path());
        let path = mgr.model_path(ModelId::FaceEmbedding);
        assert!(path.ends_with("face_embedding.onnx"));
    }

    #[test]
    fn test_ensure_model_not_cached_errors() {
        let tmp = tempfile::tempdir().expect("failed to create tempdir");
        let mgr = ModelManager::new(tmp.path());
        let err = mgr.ensure_model(ModelId::FaceEmbedding).unwrap_err();
        assert!(matches!(err, VisionError::ModelNotFound { .. }));
    }
}
