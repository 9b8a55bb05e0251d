//! # stereo-face-distance
//!
//! Estimates the distance to a single face seen by a horizontally offset
//! camera pair. Each view is run through a face detector; when exactly one
//! face is found on each side, a reference point (box centroid or one of five
//! landmarks) is picked per face and the horizontal disparity between them is
//! triangulated with the rig's baseline and focal length.
//!
//! ```
//! use stereo_face_distance::{selector, stereo, BoundingBox, CalibrationConstants, LandmarkIndex, SelectionMode};
//!
//! let calib = CalibrationConstants::default();
//! let left = BoundingBox::new(300.0, 180.0, 400.0, 300.0);
//! let right = BoundingBox::new(275.0, 180.0, 375.0, 300.0);
//! let index = LandmarkIndex::default();
//! let lp = selector::select(&left, None, SelectionMode::Centroid, index);
//! let rp = selector::select(&right, None, SelectionMode::Centroid, index);
//!
//! let est = stereo::estimate(lp, rp, 640, &calib);
//! assert_eq!(est.disparity_px, 50.0);
//! assert!(est.valid);
//! ```

pub mod annotation;
pub mod args;
pub mod camera;
pub mod config;
pub mod detector;
mod error;
pub mod font;
pub mod interaction;
pub mod landmark;
pub mod output;
pub mod pipeline;
pub mod selector;
pub mod stereo;
pub mod types;

pub use camera::{FrameSource, StereoFrame};
pub use config::{AppConfig, CalibrationConstants};
pub use error::{Error, Result};
pub use interaction::{Control, InteractionState, KeyEvent};
pub use pipeline::{FaceDetect, FrameAnalysis, LandmarkEstimate, StereoMeasurement, StereoPipeline};
pub use types::{
    BoundingBox, DistanceEstimate, LandmarkIndex, LandmarkSet, Point, RgbFrame, SelectionMode, Side,
};
