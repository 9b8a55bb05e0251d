//! Picks the single point per face that disparity is measured on.

use crate::types::{BoundingBox, LandmarkIndex, LandmarkSet, Point, SelectionMode};

/// Reference point for one face in source-image pixels.
///
/// Falls back to the box centroid when landmarks are unavailable. In landmark
/// mode the vertical offset is taken from `bottom`, not `top`; the fixed
/// calibration constants were tuned against that convention.
pub fn select(
    face: &BoundingBox,
    landmarks: Option<&LandmarkSet>,
    mode: SelectionMode,
    index: LandmarkIndex,
) -> Point {
    match (mode, landmarks) {
        (SelectionMode::Landmark, Some(lm)) => landmark_point(face, lm, index),
        _ => face.center(),
    }
}

/// Landmark `index` projected with the bottom-anchored vertical convention.
pub fn landmark_point(face: &BoundingBox, landmarks: &LandmarkSet, index: LandmarkIndex) -> Point {
    let p = landmarks.get(index);
    Point::new(
        face.left + p.x * (face.right - face.left),
        face.bottom + p.y * (face.bottom - face.top),
    )
}
