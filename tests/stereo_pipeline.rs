use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use approx::assert_relative_eq;
use stereo_face_distance::{
    BoundingBox, CalibrationConstants, FaceDetect, KeyEvent, InteractionState, LandmarkEstimate,
    LandmarkSet, Point, Result, RgbFrame, SelectionMode, StereoFrame, StereoPipeline,
};

/// Replays canned detections: one entry per `detect` call, left view first.
struct ScriptedDetector {
    script: VecDeque<Vec<BoundingBox>>,
}

impl ScriptedDetector {
    fn new(frames: Vec<(Vec<BoundingBox>, Vec<BoundingBox>)>) -> Self {
        let script = frames.into_iter().flat_map(|(l, r)| [l, r]).collect();
        Self { script }
    }
}

impl FaceDetect for ScriptedDetector {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    fn detect(&mut self, _frame: &RgbFrame) -> Result<Vec<BoundingBox>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

struct FixedLandmarks {
    set: LandmarkSet,
    calls: Rc<Cell<usize>>,
}

impl LandmarkEstimate for FixedLandmarks {
    fn name(&self) -> String {
        "fixed".to_string()
    }

    fn estimate(&mut self, crop: &RgbFrame) -> Result<LandmarkSet> {
        assert!(crop.width() > 0 && crop.height() > 0, "estimator given an empty crop");
        self.calls.set(self.calls.get() + 1);
        Ok(self.set)
    }
}

fn landmarks() -> LandmarkSet {
    LandmarkSet::new([
        Point::new(0.3, 0.35),
        Point::new(0.7, 0.35),
        Point::new(0.5, 0.2),
        Point::new(0.35, 0.75),
        Point::new(0.65, 0.75),
    ])
}

fn frame() -> StereoFrame {
    StereoFrame::new(RgbFrame::new(640, 480), RgbFrame::new(640, 480)).unwrap()
}

fn pipeline(
    frames: Vec<(Vec<BoundingBox>, Vec<BoundingBox>)>,
) -> (StereoPipeline<ScriptedDetector, FixedLandmarks>, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let lm = FixedLandmarks {
        set: landmarks(),
        calls: Rc::clone(&calls),
    };
    (
        StereoPipeline::new(ScriptedDetector::new(frames), lm, CalibrationConstants::default()),
        calls,
    )
}

const LEFT_FACE: BoundingBox = BoundingBox::new(300.0, 180.0, 400.0, 300.0);
const RIGHT_FACE: BoundingBox = BoundingBox::new(275.0, 180.0, 375.0, 300.0);

#[test]
fn centroid_mode_measures_single_faces() {
    let (mut p, calls) = pipeline(vec![(vec![LEFT_FACE], vec![RIGHT_FACE])]);
    let analysis = p.process(&frame(), &InteractionState::default()).unwrap();

    let m = analysis.measurement.expect("gate should pass");
    assert_relative_eq!(m.delta_cx, 25.0);
    assert_relative_eq!(m.estimate.disparity_px, 50.0);
    assert_relative_eq!(m.estimate.distance_mm.unwrap(), 827.0);
    assert!(m.estimate.valid);
    assert!(analysis.is_valid());
    assert_eq!(m.delta_lx, None);
    assert_eq!(calls.get(), 0, "landmarks only run in landmark mode");
}

#[test]
fn gate_skips_ambiguous_frames_without_error() {
    let two = vec![LEFT_FACE, BoundingBox::new(10.0, 10.0, 60.0, 60.0)];
    let cases = vec![
        (vec![], vec![RIGHT_FACE]),
        (vec![LEFT_FACE], vec![]),
        (vec![], vec![]),
        (two.clone(), vec![RIGHT_FACE]),
        (vec![LEFT_FACE], two.clone()),
    ];
    let n = cases.len();
    let (mut p, calls) = pipeline(cases);
    let mut state = InteractionState::default();
    state.handle(KeyEvent::ToggleMode);

    for _ in 0..n {
        let analysis = p.process(&frame(), &state).unwrap();
        assert!(analysis.measurement.is_none());
        assert!(!analysis.is_valid());
    }
    assert_eq!(calls.get(), 0);
}

#[test]
fn landmark_mode_uses_selected_landmark_from_bottom() {
    let (mut p, calls) = pipeline(vec![(vec![LEFT_FACE], vec![RIGHT_FACE])]);
    let mut state = InteractionState::default();
    state.handle(KeyEvent::ToggleMode);
    assert_eq!(state.mode, SelectionMode::Landmark);

    let m = p.process(&frame(), &state).unwrap().measurement.unwrap();
    assert_eq!(calls.get(), 2);

    // landmark 2 = (0.5, 0.2): x = left + 50, y = bottom + 0.2 * 120
    assert_relative_eq!(m.left.reference.x, 350.0);
    assert_relative_eq!(m.left.reference.y, 324.0);
    assert_relative_eq!(m.right.reference.x, 325.0);
    assert_relative_eq!(m.delta_lx.unwrap(), 25.0);
    assert_relative_eq!(m.estimate.disparity_px, 50.0);
}

#[test]
fn cycling_landmark_changes_reference_point() {
    let (mut p, _) = pipeline(vec![(vec![LEFT_FACE], vec![RIGHT_FACE])]);
    let mut state = InteractionState::default();
    state.handle(KeyEvent::ToggleMode);
    state.handle(KeyEvent::CycleLandmark);
    state.handle(KeyEvent::CycleLandmark);
    assert_eq!(state.landmark_index.get(), 4);

    let m = p.process(&frame(), &state).unwrap().measurement.unwrap();
    // landmark 4 = (0.65, 0.75)
    assert_relative_eq!(m.left.reference.x, 365.0);
    assert_relative_eq!(m.left.reference.y, 390.0);
}

#[test]
fn degenerate_crop_falls_back_to_centroid() {
    // Right face lies entirely past the frame edge, so its crop is empty.
    let outside = BoundingBox::new(650.0, 180.0, 700.0, 300.0);
    let (mut p, calls) = pipeline(vec![(vec![LEFT_FACE], vec![outside])]);
    let mut state = InteractionState::default();
    state.handle(KeyEvent::ToggleMode);

    let m = p.process(&frame(), &state).unwrap().measurement.unwrap();
    assert_eq!(calls.get(), 1);
    assert!(m.left.landmarks.is_some());
    assert!(m.right.landmarks.is_none());
    assert_eq!(m.right.reference, outside.center());
    assert_eq!(m.delta_lx, None);
}

#[test]
fn identical_views_give_undefined_distance() {
    let (mut p, _) = pipeline(vec![(vec![LEFT_FACE], vec![LEFT_FACE])]);
    let m = p.process(&frame(), &InteractionState::default()).unwrap().measurement.unwrap();
    assert_eq!(m.estimate.disparity_px, 0.0);
    assert_eq!(m.estimate.distance_mm, None);
    assert!(!m.estimate.valid);
}

#[test]
fn frames_are_independent() {
    let (mut p, _) = pipeline(vec![
        (vec![LEFT_FACE], vec![RIGHT_FACE]),
        (vec![], vec![RIGHT_FACE]),
        (vec![LEFT_FACE], vec![RIGHT_FACE]),
    ]);
    let state = InteractionState::default();
    let first = p.process(&frame(), &state).unwrap();
    let second = p.process(&frame(), &state).unwrap();
    let third = p.process(&frame(), &state).unwrap();
    assert!(first.measurement.is_some());
    assert!(second.measurement.is_none());
    assert_eq!(first, third);
}
