//! vidid-vision - identity recognition primitives.
//!
//! Provides the per-identity gallery ([`gallery::ImagesSimilarity`]) the
//! orchestrator queries and mutates across its three passes, built over a
//! pluggable [`recognizer::RecognizerBackend`]: a deterministic CPU heuristic
//! by default, an ONNX face-embedding model behind the `onnx` feature.

pub mod error;
pub mod gallery;
pub mod model_manager;
pub mod recognizer;
#[cfg(feature = "onnx")]
pub mod session;

pub use error::{Result, VisionError};
pub use gallery::{coords_similarity, IdentityRecord, ImagesSimilarity};
pub use model_manager::{ModelId, ModelManager, ModelSpec};
pub use recognizer::{cosine_similarity, HeuristicRecognizer, RecognizerBackend};

#[cfg(feature = "onnx")]
pub use recognizer::OnnxRecognizer;
