//! Draws detections, reference markers and measurements onto the two views.
//!
//! Nothing here feeds back into the estimator; the inputs are read-only
//! results of [`crate::pipeline::StereoPipeline::process`].

use image::{imageops, Rgb};

use crate::camera::StereoFrame;
use crate::config::UiConfig;
use crate::font;
use crate::interaction::InteractionState;
use crate::pipeline::{FaceObservation, FrameAnalysis, StereoMeasurement};
use crate::types::{BoundingBox, Point, RgbFrame, SelectionMode, Side};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const CYAN: Rgb<u8> = Rgb([0, 255, 255]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Box color before any distance is known.
pub fn camera_color(side: Side) -> Rgb<u8> {
    match side {
        Side::Left => WHITE,
        Side::Right => CYAN,
    }
}

pub fn validity_color(valid: bool) -> Rgb<u8> {
    if valid {
        GREEN
    } else {
        RED
    }
}

/// A straight line between two pixel positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub from: (i32, i32),
    pub to: (i32, i32),
}

impl Segment {
    const fn new(from: (i32, i32), to: (i32, i32)) -> Self {
        Self { from, to }
    }
}

/// Eight `length`-pixel strokes, two per corner, pointing inward along the edges.
pub fn corner_segments(face: &BoundingBox, length: i32) -> [Segment; 8] {
    let (x1, y1) = (face.left as i32, face.top as i32);
    let (x2, y2) = (face.right as i32, face.bottom as i32);
    [
        Segment::new((x1, y1), (x1 + length, y1)),
        Segment::new((x1, y1), (x1, y1 + length)),
        Segment::new((x2, y1), (x2 - length, y1)),
        Segment::new((x2, y1), (x2, y1 + length)),
        Segment::new((x1, y2), (x1 + length, y2)),
        Segment::new((x1, y2), (x1, y2 - length)),
        Segment::new((x2, y2), (x2 - length, y2)),
        Segment::new((x2, y2), (x2, y2 - length)),
    ]
}

fn put(img: &mut RgbFrame, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Thick line, stamped as a square brush along the segment.
pub fn draw_segment(img: &mut RgbFrame, seg: Segment, thickness: i32, color: Rgb<u8>) {
    let (x0, y0) = seg.from;
    let (x1, y1) = seg.to;
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
    let lo = -(thickness / 2);
    let hi = lo + thickness.max(1);
    for s in 0..=steps {
        let x = x0 + (x1 - x0) * s / steps;
        let y = y0 + (y1 - y0) * s / steps;
        for dy in lo..hi {
            for dx in lo..hi {
                put(img, x + dx, y + dy, color);
            }
        }
    }
}

pub fn draw_corner_rect(img: &mut RgbFrame, face: &BoundingBox, ui: &UiConfig, color: Rgb<u8>) {
    for seg in corner_segments(face, ui.corner_length as i32) {
        draw_segment(img, seg, ui.corner_thickness as i32, color);
    }
}

pub fn fill_circle(img: &mut RgbFrame, center: Point, radius: i32, color: Rgb<u8>) {
    let (cx, cy) = (center.x as i32, center.y as i32);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Hollow circle with a `width`-pixel ring.
pub fn ring(img: &mut RgbFrame, center: Point, radius: i32, width: i32, color: Rgb<u8>) {
    let (cx, cy) = (center.x as i32, center.y as i32);
    let outer = radius + width / 2;
    let inner = (radius - width / 2 - 1).max(0);
    for dy in -outer..=outer {
        for dx in -outer..=outer {
            let d2 = dx * dx + dy * dy;
            if d2 <= outer * outer && d2 > inner * inner {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Place two frames of equal height side by side.
pub fn hconcat(left: &RgbFrame, right: &RgbFrame) -> RgbFrame {
    let height = left.height().max(right.height());
    let mut out = RgbFrame::new(left.width() + right.width(), height);
    imageops::replace(&mut out, left, 0, 0);
    imageops::replace(&mut out, right, left.width() as i64, 0);
    out
}

pub struct Annotator {
    ui: UiConfig,
}

impl Annotator {
    pub fn new(ui: UiConfig) -> Self {
        Self { ui }
    }

    fn text_line(&self, line: usize) -> usize {
        10 + line * font::line_height(self.ui.text_scale)
    }

    /// Annotated copies of both views, left then right.
    pub fn annotate(
        &self,
        frame: &StereoFrame,
        analysis: &FrameAnalysis,
        state: &InteractionState,
    ) -> (RgbFrame, RgbFrame) {
        let mut left = frame.left.clone();
        let mut right = frame.right.clone();

        // Primary view: validity colors only.
        let valid = analysis.is_valid();
        for face in &analysis.left_faces {
            draw_corner_rect(&mut left, face, &self.ui, validity_color(valid));
        }

        match &analysis.measurement {
            Some(m) => {
                self.draw_estimate(&mut left, m);
                // Secondary view carries both faces and the diagnostics.
                self.draw_observation(&mut right, &m.left, state);
                self.draw_observation(&mut right, &m.right, state);
                self.draw_diagnostics(&mut right, m, state);
            }
            None => {
                for face in &analysis.right_faces {
                    draw_corner_rect(&mut right, face, &self.ui, camera_color(Side::Right));
                }
            }
        }

        self.draw_mode(&mut right, state);
        (left, right)
    }

    /// Annotate and concatenate into one display frame.
    pub fn compose(&self, frame: &StereoFrame, analysis: &FrameAnalysis, state: &InteractionState) -> RgbFrame {
        let (left, right) = self.annotate(frame, analysis, state);
        hconcat(&left, &right)
    }

    fn draw_observation(&self, img: &mut RgbFrame, obs: &FaceObservation, state: &InteractionState) {
        let color = camera_color(obs.side);
        let radius = self.ui.marker_radius as i32;
        draw_corner_rect(img, &obs.face, &self.ui, color);

        if let (SelectionMode::Landmark, Some(lm)) = (state.mode, &obs.landmarks) {
            for p in lm.to_image(&obs.face) {
                ring(img, p, radius - 1, 2, color);
            }
        }
        fill_circle(img, obs.reference, radius, color);
    }

    fn draw_estimate(&self, img: &mut RgbFrame, m: &StereoMeasurement) {
        let scale = self.ui.text_scale;
        let disparity = format!("disparity : {} pixels", m.estimate.disparity_px as i64);
        let distance = match m.estimate.distance_mm {
            Some(d) => format!("distance : {} mm", d as i64),
            None => "distance : -- mm".to_string(),
        };
        font::draw_text(img, 20, self.text_line(0), &disparity, WHITE, scale);
        font::draw_text(img, 20, self.text_line(1), &distance, WHITE, scale);
    }

    fn draw_diagnostics(&self, img: &mut RgbFrame, m: &StereoMeasurement, state: &InteractionState) {
        let scale = self.ui.text_scale;
        let cx = format!("delta_cx={}", m.delta_cx as i64);
        let lx = match m.delta_lx {
            Some(d) => format!("delta_lx={}", d as i64),
            None => "delta_lx=--".to_string(),
        };
        let (cx_color, lx_color) = match state.mode {
            SelectionMode::Centroid => (CYAN, WHITE),
            SelectionMode::Landmark => (WHITE, CYAN),
        };
        font::draw_text(img, 20, self.text_line(0), &cx, cx_color, scale);
        font::draw_text(img, 20, self.text_line(1), &lx, lx_color, scale);
    }

    fn draw_mode(&self, img: &mut RgbFrame, state: &InteractionState) {
        let text = match state.mode {
            SelectionMode::Centroid => "centroid".to_string(),
            SelectionMode::Landmark => format!("landmark {}", state.landmark_index.get()),
        };
        let scale = self.ui.text_scale;
        let y = (img.height() as usize).saturating_sub(font::line_height(scale) + 4);
        font::draw_text(img, 20, y, &text, WHITE, scale);
    }
}
