//! Disparity-to-distance triangulation.
//!
//! `distance = baseline * focal_length / disparity`, with the disparity first
//! rescaled from the capture resolution to the active-array width the focal
//! length was calibrated at.

use crate::config::CalibrationConstants;
use crate::types::{DistanceEstimate, Point};

/// Disparities at or below this many pixels are treated as "no depth cue".
pub const MIN_DISPARITY_PX: f32 = 1e-3;

/// Rescale a disparity measured at `capture_width` to the calibration width.
pub fn rescale_disparity(delta_x: f32, capture_width: u32, calib: &CalibrationConstants) -> f32 {
    delta_x * (calib.reference_width_px / capture_width as f32)
}

/// Triangulate distance from a rescaled disparity. `None` when degenerate.
pub fn distance_from_disparity(disparity: f32, calib: &CalibrationConstants) -> Option<f32> {
    if !disparity.is_finite() || disparity <= MIN_DISPARITY_PX {
        return None;
    }
    Some((calib.baseline_mm * calib.focal_length_px) / disparity)
}

/// Estimate distance from the reference points of the same face in both views.
///
/// Only the horizontal separation feeds the formula. A zero-width capture or
/// coincident points yield `distance_mm: None` and `valid: false`.
pub fn estimate(
    left: Point,
    right: Point,
    capture_width: u32,
    calib: &CalibrationConstants,
) -> DistanceEstimate {
    if capture_width == 0 {
        return DistanceEstimate {
            disparity_px: 0.0,
            distance_mm: None,
            valid: false,
        };
    }

    let delta_x = (left.x - right.x).abs();
    let disparity_px = rescale_disparity(delta_x, capture_width, calib);
    let distance_mm = distance_from_disparity(disparity_px, calib);
    let valid = distance_mm.is_some_and(|d| calib.is_within_window(d));

    DistanceEstimate {
        disparity_px,
        distance_mm,
        valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_calib(baseline_times_focal: f32, width: f32) -> CalibrationConstants {
        CalibrationConstants {
            baseline_mm: baseline_times_focal,
            focal_length_px: 1.0,
            reference_width_px: width,
            min_valid_mm: 500.0,
            max_valid_mm: 1000.0,
        }
    }

    #[test]
    fn default_rig_at_vga() {
        let calib = CalibrationConstants::default();
        // 25 px at 640 wide is 50 px on the 1280 active array.
        let est = estimate(Point::new(345.0, 200.0), Point::new(320.0, 210.0), 640, &calib);
        assert_relative_eq!(est.disparity_px, 50.0);
        assert_relative_eq!(est.distance_mm.unwrap(), 827.0);
        assert!(est.valid);
    }

    #[test]
    fn rescale_depends_only_on_width_ratio() {
        // Scaling reference and capture widths by the same factor leaves the disparity unchanged.
        let left = Point::new(412.5, 100.0);
        let right = Point::new(377.25, 100.0);
        let calib = CalibrationConstants::default();
        let doubled = CalibrationConstants {
            reference_width_px: calib.reference_width_px * 2.0,
            ..calib
        };
        let a = estimate(left, right, 640, &calib);
        let b = estimate(left, right, 1280, &doubled);
        assert_relative_eq!(a.disparity_px, b.disparity_px);
        assert_eq!(a.valid, b.valid);
    }

    #[test]
    fn distance_strictly_decreases_with_disparity() {
        let calib = CalibrationConstants::default();
        let mut previous = f32::INFINITY;
        for step in 1..200 {
            let d = distance_from_disparity(step as f32 * 0.5, &calib).unwrap();
            assert!(d < previous, "{d} not below {previous}");
            previous = d;
        }
    }

    #[test]
    fn window_bounds_are_exclusive() {
        // Exactly min (1000 / 2) and exactly max (1000 / 1).
        let calib = unit_calib(1000.0, 640.0);
        let at_min = estimate(Point::new(2.0, 0.0), Point::new(0.0, 0.0), 640, &calib);
        assert_eq!(at_min.distance_mm, Some(500.0));
        assert!(!at_min.valid);
        let at_max = estimate(Point::new(1.0, 0.0), Point::new(0.0, 0.0), 640, &calib);
        assert_eq!(at_max.distance_mm, Some(1000.0));
        assert!(!at_max.valid);

        let just_above_min = estimate(Point::new(1.0, 0.0), Point::new(0.0, 0.0), 640, &unit_calib(501.0, 640.0));
        assert_eq!(just_above_min.distance_mm, Some(501.0));
        assert!(just_above_min.valid);
        let just_below_max = estimate(Point::new(1.0, 0.0), Point::new(0.0, 0.0), 640, &unit_calib(999.0, 640.0));
        assert_eq!(just_below_max.distance_mm, Some(999.0));
        assert!(just_below_max.valid);
    }

    #[test]
    fn coincident_points_have_no_distance() {
        let calib = CalibrationConstants::default();
        let est = estimate(Point::new(100.0, 10.0), Point::new(100.0, 90.0), 640, &calib);
        assert_eq!(est.disparity_px, 0.0);
        assert_eq!(est.distance_mm, None);
        assert!(!est.valid);
    }

    #[test]
    fn vertical_offset_does_not_change_distance() {
        let calib = CalibrationConstants::default();
        let a = estimate(Point::new(300.0, 100.0), Point::new(280.0, 100.0), 640, &calib);
        let b = estimate(Point::new(300.0, 100.0), Point::new(280.0, 160.0), 640, &calib);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_capture_width_is_degenerate() {
        let est = estimate(Point::new(10.0, 0.0), Point::new(0.0, 0.0), 0, &CalibrationConstants::default());
        assert_eq!(est.distance_mm, None);
        assert!(!est.valid);
    }
}
