//! Orchestrator configuration: every public tuning knob, loadable from an
//! optional TOML file and overridable by CLI flags, with a `validate()` that
//! re-checks every range invariant the orchestrator's own setters enforce —
//! so a bad config fails fast before any video I/O happens.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IdentifyError, Result};

fn default_nb_images_recognizer() -> usize {
    20
}

fn default_face_min_confidence() -> f32 {
    0.9
}

fn default_compare_coords_min_threshold() -> f32 {
    0.4
}

fn default_compare_coords_ref_min_threshold() -> f32 {
    0.6
}

fn default_coords_min_dist() -> f32 {
    0.1
}

fn default_images_min_dist() -> f32 {
    0.8
}

fn default_true() -> bool {
    true
}

fn default_out_shift() -> f32 {
    0.0
}

fn default_out_width() -> u32 {
    480
}

fn default_out_height() -> u32 {
    480
}

fn default_pass3_window_seconds() -> f64 {
    3.0
}

/// Every public orchestrator option, per the configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gallery cap per identity (`NUMBER_OF_FACE_KID_IMAGES`).
    #[serde(default = "default_nb_images_recognizer")]
    pub nb_images_recognizer: usize,

    /// Minimum detection confidence to enter pass 1 discovery.
    #[serde(default = "default_face_min_confidence")]
    pub face_min_confidence: f32,

    /// Minimum score to match an identity by coords.
    #[serde(default = "default_compare_coords_min_threshold")]
    pub compare_coords_min_threshold: f32,

    /// Minimum score to add a gallery image (`MIN_ADDREF_COMPARE_COORDS`).
    #[serde(default = "default_compare_coords_ref_min_threshold")]
    pub compare_coords_ref_min_threshold: f32,

    /// Candidate-dedup threshold between two identities, by coords
    /// (`MIN_DISTANCE_KIDS_COORDS`).
    #[serde(default = "default_coords_min_dist")]
    pub coords_min_dist: f32,

    /// Candidate-dedup threshold between two identities, by images
    /// (`MIN_DISTANCE_KIDS_IMAGES`).
    #[serde(default = "default_images_min_dist")]
    pub images_min_dist: f32,

    /// Emit per-identity video/coords.
    #[serde(default = "default_true")]
    pub out_ident: bool,

    /// Use selfie portrait scaling instead of the standard portrait.
    #[serde(default = "default_true")]
    pub out_selfie: bool,

    /// Percent shift of x for per-identity output, in `(-100, 100)`.
    #[serde(default = "default_out_shift")]
    pub out_shift: f32,

    /// Emit the aggregate (all-identities-annotated) video/coords stream.
    #[serde(default = "default_true")]
    pub out_aggregate: bool,

    /// Width of per-identity letterboxed output frames.
    #[serde(default = "default_out_width")]
    pub out_width: u32,

    /// Height of per-identity letterboxed output frames.
    #[serde(default = "default_out_height")]
    pub out_height: u32,

    /// Length, in seconds, of the dedicated smoothing/emission window used
    /// by pass 3 (independent of the discovery/identification window size).
    #[serde(default = "default_pass3_window_seconds")]
    pub pass3_window_seconds: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            nb_images_recognizer: default_nb_images_recognizer(),
            face_min_confidence: default_face_min_confidence(),
            compare_coords_min_threshold: default_compare_coords_min_threshold(),
            compare_coords_ref_min_threshold: default_compare_coords_ref_min_threshold(),
            coords_min_dist: default_coords_min_dist(),
            images_min_dist: default_images_min_dist(),
            out_ident: true,
            out_selfie: true,
            out_shift: default_out_shift(),
            out_aggregate: true,
            out_width: default_out_width(),
            out_height: default_out_height(),
            pass3_window_seconds: default_pass3_window_seconds(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to compiled
    /// defaults if `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::load_from_path(p)?,
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| IdentifyError::Config(format!("failed to parse {}: {e}", path.display())))?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let serialized = toml::to_string_pretty(self)
            .map_err(|e| IdentifyError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Re-checks every range invariant the orchestrator's own setters
    /// enforce, so a bad config fails fast before any video I/O happens.
    pub fn validate(&self) -> Result<()> {
        if self.nb_images_recognizer == 0 {
            return Err(IdentifyError::InvalidArgument(
                "nb_images_recognizer must be non-zero".into(),
            ));
        }
        for (name, value) in [
            ("face_min_confidence", self.face_min_confidence),
            (
                "compare_coords_min_threshold",
                self.compare_coords_min_threshold,
            ),
            (
                "compare_coords_ref_min_threshold",
                self.compare_coords_ref_min_threshold,
            ),
            ("coords_min_dist", self.coords_min_dist),
            ("images_min_dist", self.images_min_dist),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(IdentifyError::InvalidArgument(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if !(-100.0..100.0).contains(&self.out_shift) {
            return Err(IdentifyError::InvalidArgument(format!(
                "out_shift must be in (-100, 100), got {}",
                self.out_shift
            )));
        }
        if self.out_width == 0 || self.out_height == 0 {
            return Err(IdentifyError::InvalidArgument(
                "out_width/out_height must be non-zero".into(),
            ));
        }
        if self.pass3_window_seconds <= 0.0 {
            return Err(IdentifyError::InvalidArgument(format!(
                "pass3_window_seconds must be positive, got {}",
                self.pass3_window_seconds
            )));
        }
        Ok(())
    }
}

/// Resolves the model cache directory used by the optional ONNX recognizer,
/// following the teacher's `dirs`-based cache-dir convention.
pub fn default_model_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("vidid")
        .join("models")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut config = Config::default();
        config.face_min_confidence = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, IdentifyError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_out_of_range_shift() {
        let mut config = Config::default();
        config.out_shift = 150.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let mut config = Config::default();
        config.nb_images_recognizer = 12;
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.nb_images_recognizer, 12);
    }
}
