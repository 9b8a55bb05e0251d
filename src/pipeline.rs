use image::imageops;
use serde::Serialize;
use tracing::debug;

use crate::camera::StereoFrame;
use crate::config::CalibrationConstants;
use crate::error::Result;
use crate::interaction::InteractionState;
use crate::selector;
use crate::stereo;
use crate::types::{BoundingBox, DistanceEstimate, LandmarkSet, Point, RgbFrame, Side};

/// Face detector seam: one image in, zero or more boxes out.
pub trait FaceDetect {
    fn name(&self) -> String;
    fn detect(&mut self, frame: &RgbFrame) -> Result<Vec<BoundingBox>>;
}

/// Landmark seam: one non-empty face crop in, five normalized points out.
pub trait LandmarkEstimate {
    fn name(&self) -> String;
    fn estimate(&mut self, crop: &RgbFrame) -> Result<LandmarkSet>;
}

/// One gated face with the point its disparity is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceObservation {
    pub side: Side,
    pub face: BoundingBox,
    pub landmarks: Option<LandmarkSet>,
    pub reference: Point,
}

/// Everything computed once the exactly-one-face gate passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StereoMeasurement {
    pub left: FaceObservation,
    pub right: FaceObservation,
    /// Centroid separation at capture resolution.
    pub delta_cx: f32,
    pub delta_cy: f32,
    /// Landmark separation, only when both faces have landmarks.
    pub delta_lx: Option<f32>,
    pub delta_ly: Option<f32>,
    pub estimate: DistanceEstimate,
}

/// Per-frame result. `measurement` is `None` whenever the gate rejected the frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameAnalysis {
    pub capture_width: u32,
    pub left_faces: Vec<BoundingBox>,
    pub right_faces: Vec<BoundingBox>,
    pub measurement: Option<StereoMeasurement>,
}

impl FrameAnalysis {
    pub fn is_valid(&self) -> bool {
        self.measurement.is_some_and(|m| m.estimate.valid)
    }
}

/// Exactly one face on each side, or nothing.
pub fn gate(left: &[BoundingBox], right: &[BoundingBox]) -> Option<(BoundingBox, BoundingBox)> {
    match (left, right) {
        ([l], [r]) => Some((*l, *r)),
        _ => None,
    }
}

/// Integer crop window for a face, or `None` if it is empty after clamping.
pub fn crop_window(face: &BoundingBox, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let clamped = face.clamp_to(width, height);
    let x0 = clamped.left as u32;
    let y0 = clamped.top as u32;
    let x1 = clamped.right as u32;
    let y1 = clamped.bottom as u32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0, y0, x1 - x0, y1 - y0))
}

pub struct StereoPipeline<D, L> {
    detector: D,
    landmarks: L,
    calibration: CalibrationConstants,
}

impl<D: FaceDetect, L: LandmarkEstimate> StereoPipeline<D, L> {
    pub fn new(detector: D, landmarks: L, calibration: CalibrationConstants) -> Self {
        Self {
            detector,
            landmarks,
            calibration,
        }
    }

    pub fn name(&self) -> String {
        format!("{} + {}", self.detector.name(), self.landmarks.name())
    }

    pub fn calibration(&self) -> &CalibrationConstants {
        &self.calibration
    }

    /// Run one cycle: detect on both views, gate, select points, triangulate.
    pub fn process(&mut self, frame: &StereoFrame, state: &InteractionState) -> Result<FrameAnalysis> {
        let left_faces = self.detector.detect(&frame.left)?;
        let right_faces = self.detector.detect(&frame.right)?;
        let capture_width = frame.width();

        let Some((left_face, right_face)) = gate(&left_faces, &right_faces) else {
            debug!(
                left = left_faces.len(),
                right = right_faces.len(),
                "need exactly one face per view, skipping distance"
            );
            return Ok(FrameAnalysis {
                capture_width,
                left_faces,
                right_faces,
                measurement: None,
            });
        };

        let left = self.observe(Side::Left, &frame.left, left_face, state)?;
        let right = self.observe(Side::Right, &frame.right, right_face, state)?;

        let estimate = stereo::estimate(left.reference, right.reference, capture_width, &self.calibration);

        let lc = left_face.center();
        let rc = right_face.center();
        let (delta_lx, delta_ly) = match (&left.landmarks, &right.landmarks) {
            (Some(ll), Some(rl)) => {
                let lp = selector::landmark_point(&left_face, ll, state.landmark_index);
                let rp = selector::landmark_point(&right_face, rl, state.landmark_index);
                (Some((lp.x - rp.x).abs()), Some((rp.y - lp.y).abs()))
            }
            _ => (None, None),
        };

        debug!(
            disparity = estimate.disparity_px,
            distance = ?estimate.distance_mm,
            valid = estimate.valid,
            "stereo estimate"
        );

        Ok(FrameAnalysis {
            capture_width,
            left_faces,
            right_faces,
            measurement: Some(StereoMeasurement {
                left,
                right,
                delta_cx: (lc.x - rc.x).abs(),
                delta_cy: (rc.y - lc.y).abs(),
                delta_lx,
                delta_ly,
                estimate,
            }),
        })
    }

    fn observe(
        &mut self,
        side: Side,
        image: &RgbFrame,
        face: BoundingBox,
        state: &InteractionState,
    ) -> Result<FaceObservation> {
        let landmarks = if state.mode.uses_landmarks() {
            match crop_window(&face, image.width(), image.height()) {
                Some((x, y, w, h)) => {
                    let crop = imageops::crop_imm(image, x, y, w, h).to_image();
                    Some(self.landmarks.estimate(&crop)?)
                }
                None => {
                    debug!(?side, "empty face crop, landmarks skipped");
                    None
                }
            }
        } else {
            None
        };

        let reference = selector::select(&face, landmarks.as_ref(), state.mode, state.landmark_index);
        Ok(FaceObservation {
            side,
            face,
            landmarks,
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_requires_exactly_one_each() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(gate(&[a], &[a]).is_some());
        assert!(gate(&[], &[a]).is_none());
        assert!(gate(&[a], &[]).is_none());
        assert!(gate(&[a, a], &[a]).is_none());
        assert!(gate(&[a], &[a, a, a]).is_none());
    }

    #[test]
    fn crop_window_rejects_degenerate_boxes() {
        assert_eq!(
            crop_window(&BoundingBox::new(10.4, 20.0, 50.9, 60.0), 640, 480),
            Some((10, 20, 40, 40))
        );
        assert!(crop_window(&BoundingBox::new(10.2, 20.0, 10.8, 60.0), 640, 480).is_none());
        assert!(crop_window(&BoundingBox::new(700.0, 20.0, 720.0, 60.0), 640, 480).is_none());
    }
}
