use image::{ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};

/// 8-bit RGB frame as delivered by the camera and consumed by the models.
pub type RgbFrame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Number of points produced by the landmark estimator.
pub const LANDMARK_COUNT: usize = 5;

/// A 2D point in pixel (or normalized) coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Face detector output in source-image pixels.
///
/// Stored as corners rather than origin + size because both the selector and
/// the renderer work on edges directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn iou(&self, other: &Self) -> f32 {
        let inter_w = (self.right.min(other.right) - self.left.max(other.left)).max(0.0);
        let inter_h = (self.bottom.min(other.bottom) - self.top.max(other.top)).max(0.0);
        let inter = inter_w * inter_h;
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }

    /// Clamp the box into a `width` x `height` image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let w = width as f32;
        let h = height as f32;
        Self {
            left: self.left.clamp(0.0, w),
            top: self.top.clamp(0.0, h),
            right: self.right.clamp(0.0, w),
            bottom: self.bottom.clamp(0.0, h),
        }
    }
}

/// Five normalized points relative to the face crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub points: [Point; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub const fn new(points: [Point; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn get(&self, index: LandmarkIndex) -> Point {
        self.points[index.get()]
    }

    /// Map every landmark into source-image pixels using the crop's top-left corner,
    /// which is how the overlay places the landmark dots.
    pub fn to_image(&self, face: &BoundingBox) -> [Point; LANDMARK_COUNT] {
        self.points.map(|p| {
            Point::new(
                face.left + p.x * face.width(),
                face.top + p.y * face.height(),
            )
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    #[default]
    Centroid,
    Landmark,
}

impl SelectionMode {
    pub fn toggled(self) -> Self {
        match self {
            SelectionMode::Centroid => SelectionMode::Landmark,
            SelectionMode::Landmark => SelectionMode::Centroid,
        }
    }

    pub fn uses_landmarks(self) -> bool {
        self == SelectionMode::Landmark
    }
}

/// Index into a [`LandmarkSet`]; always in `0..LANDMARK_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkIndex(usize);

impl LandmarkIndex {
    /// Returns `None` when `index` is out of range.
    pub fn new(index: usize) -> Option<Self> {
        (index < LANDMARK_COUNT).then_some(Self(index))
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn next(self) -> Self {
        Self((self.0 + 1) % LANDMARK_COUNT)
    }
}

impl Default for LandmarkIndex {
    fn default() -> Self {
        Self(2)
    }
}

/// Result of the stereo triangulation for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceEstimate {
    /// Horizontal disparity rescaled to the reference active-array width.
    pub disparity_px: f32,
    /// `None` when the disparity is too small to triangulate.
    pub distance_mm: Option<f32>,
    pub valid: bool,
}

/// Which camera of the rig an image or box came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
}
