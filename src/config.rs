use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub calibration: CalibrationConstants,
    pub models: ModelConfig,
    pub ui: UiConfig,
}

/// Optical model of the rig. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConstants {
    /// Distance between the two lenses.
    pub baseline_mm: f32,
    /// Focal length in pixels, measured at `reference_width_px`.
    pub focal_length_px: f32,
    /// Sensor active-array width the focal length was calibrated at.
    pub reference_width_px: f32,
    pub min_valid_mm: f32,
    pub max_valid_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub face_detection_path: String,
    pub face_landmark_path: String,
    /// Detector input (width, height).
    pub detector_input: (u32, u32),
    /// Landmark model input (width, height).
    pub landmark_input: (u32, u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub corner_length: u32,
    pub corner_thickness: u32,
    pub marker_radius: u32,
    pub text_scale: usize,
}

impl Default for CalibrationConstants {
    // AR0144 rig: 50 mm baseline, 2.48 mm lens over 3 um pixels, 1280 px active array.
    fn default() -> Self {
        Self {
            baseline_mm: 50.0,
            focal_length_px: 827.0,
            reference_width_px: 1280.0,
            min_valid_mm: 500.0,
            max_valid_mm: 1000.0,
        }
    }
}

impl CalibrationConstants {
    pub fn validate(&self) -> Result<()> {
        if !(self.baseline_mm > 0.0) {
            return Err(Error::InvalidCalibration(format!(
                "baseline_mm must be positive, got {}",
                self.baseline_mm
            )));
        }
        if !(self.focal_length_px > 0.0) {
            return Err(Error::InvalidCalibration(format!(
                "focal_length_px must be positive, got {}",
                self.focal_length_px
            )));
        }
        if !(self.reference_width_px > 0.0) {
            return Err(Error::InvalidCalibration(format!(
                "reference_width_px must be positive, got {}",
                self.reference_width_px
            )));
        }
        if !(self.min_valid_mm < self.max_valid_mm) {
            return Err(Error::InvalidCalibration(format!(
                "valid window [{}, {}] is empty",
                self.min_valid_mm, self.max_valid_mm
            )));
        }
        Ok(())
    }

    /// Strict on both ends of the window.
    pub fn is_within_window(&self, distance_mm: f32) -> bool {
        self.min_valid_mm < distance_mm && distance_mm < self.max_valid_mm
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_detection_path: "models/face_detection.onnx".to_string(),
            face_landmark_path: "models/face_landmark.onnx".to_string(),
            detector_input: (320, 240),
            landmark_input: (96, 72),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            corner_length: 20,
            corner_thickness: 5,
            marker_radius: 4,
            text_scale: 2,
        }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "config.json";

    /// Load from `path`, using defaults when the file is missing, then write it
    /// back so new fields show up in the file. A file that does not parse is an
    /// error and is left untouched.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path)?;
            let config = serde_json::from_str::<AppConfig>(&content).map_err(|e| {
                error!(path = %path.display(), error = %e, "config parse failed");
                Error::Json(e)
            })?;
            info!(path = %path.display(), "loaded configuration");
            config
        } else {
            info!(path = %path.display(), "configuration file not found, creating default");
            Self::default()
        };

        config.calibration.validate()?;
        config.save(path)?;

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from(Self::DEFAULT_PATH)
    }
}
