use image::imageops::{self, FilterType};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tracing::info;

use crate::error::{Error, Result};
use crate::pipeline::FaceDetect;
use crate::types::{BoundingBox, RgbFrame};

/// Detection and NMS thresholds, both in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorThresholds {
    pub detection: f32,
    pub nms: f32,
}

impl DetectorThresholds {
    pub fn new(detection: f32, nms: f32) -> Result<Self> {
        check_unit("detection threshold", detection)?;
        check_unit("NMS threshold", nms)?;
        Ok(Self { detection, nms })
    }
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            detection: 0.55,
            nms: 0.35,
        }
    }
}

fn check_unit(name: &'static str, value: f32) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidThreshold { name, value })
    }
}

/// Decoded candidate before suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredBox {
    pub rect: BoundingBox,
    pub score: f32,
}

/// UltraFace (RFB/slim) detector running through ONNX Runtime.
pub struct FaceDetector {
    session: Session,
    anchors: Vec<(f32, f32, f32, f32)>, // cx, cy, w, h (normalized)
    input_width: u32,
    input_height: u32,
    thresholds: DetectorThresholds,
}

impl FaceDetector {
    pub fn new(model_path: &str, input: (u32, u32), thresholds: DetectorThresholds) -> Result<Self> {
        let session = Session::builder()
            .map_err(Error::inference)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(Error::inference)?
            .with_intra_threads(4)
            .map_err(Error::inference)?
            .with_execution_providers([
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])
            .map_err(Error::inference)?
            .commit_from_file(model_path)
            .map_err(Error::inference)?;

        let (input_width, input_height) = input;
        let anchors = generate_anchors(input_width as usize, input_height as usize);
        info!(model = model_path, anchors = anchors.len(), ?thresholds, "face detector loaded");
        Ok(Self {
            session,
            anchors,
            input_width,
            input_height,
            thresholds,
        })
    }

    fn preprocess(&self, frame: &RgbFrame) -> Vec<f32> {
        let width = self.input_width;
        let height = self.input_height;
        let resized = imageops::resize(frame, width, height, FilterType::Triangle);

        // NCHW, (pixel - 127) / 128
        let mut input_data = Vec::with_capacity((3 * width * height) as usize);
        for c in 0..3 {
            for y in 0..height {
                for x in 0..width {
                    let p = resized.get_pixel(x, y)[c];
                    input_data.push((p as f32 - 127.0) / 128.0);
                }
            }
        }
        input_data
    }
}

impl FaceDetect for FaceDetector {
    fn name(&self) -> String {
        "Face Detection (UltraFace)".to_string()
    }

    fn detect(&mut self, frame: &RgbFrame) -> Result<Vec<BoundingBox>> {
        let input_data = self.preprocess(frame);
        let shape = [1usize, 3, self.input_height as usize, self.input_width as usize];
        let input_tensor = Tensor::from_array((shape, input_data)).map_err(Error::inference)?;
        let outputs = self.session.run(ort::inputs![input_tensor]).map_err(Error::inference)?;

        let (_scores_shape, scores_data) = outputs["scores"].try_extract_tensor::<f32>().map_err(Error::inference)?;
        let (_boxes_shape, boxes_data) = outputs["boxes"].try_extract_tensor::<f32>().map_err(Error::inference)?;

        let n = self.anchors.len();
        if scores_data.len() < n * 2 || boxes_data.len() < n * 4 {
            return Err(Error::UnexpectedModelOutput {
                got: scores_data.len().min(boxes_data.len()),
                expected: n * 4,
            });
        }

        let candidates = decode(&self.anchors, scores_data, boxes_data, self.thresholds.detection);
        let kept = non_max_suppression(candidates, self.thresholds.nms);

        let (fw, fh) = frame.dimensions();
        Ok(kept
            .into_iter()
            .map(|s| {
                BoundingBox::new(
                    s.rect.left * fw as f32,
                    s.rect.top * fh as f32,
                    s.rect.right * fw as f32,
                    s.rect.bottom * fh as f32,
                )
                .clamp_to(fw, fh)
            })
            .filter(|b| b.width() > 0.0 && b.height() > 0.0)
            .collect())
    }
}

/// Decode anchor-relative boxes into normalized corners, keeping scores above `threshold`.
pub fn decode(
    anchors: &[(f32, f32, f32, f32)],
    scores_raw: &[f32],
    boxes_raw: &[f32],
    threshold: f32,
) -> Vec<ScoredBox> {
    // UltraFace prior variances
    let center_variance = 0.1;
    let size_variance = 0.2;

    let mut out = Vec::new();
    for (i, &(ax, ay, aw, ah)) in anchors.iter().enumerate() {
        let score = scores_raw[i * 2 + 1];
        if score < threshold {
            continue;
        }
        let cx = boxes_raw[i * 4] * center_variance * aw + ax;
        let cy = boxes_raw[i * 4 + 1] * center_variance * ah + ay;
        let w = (boxes_raw[i * 4 + 2] * size_variance).exp() * aw;
        let h = (boxes_raw[i * 4 + 3] * size_variance).exp() * ah;

        out.push(ScoredBox {
            rect: BoundingBox::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0),
            score,
        });
    }
    out
}

/// Greedy NMS. Output is ordered by descending score.
pub fn non_max_suppression(mut boxes: Vec<ScoredBox>, iou_threshold: f32) -> Vec<ScoredBox> {
    boxes.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut keep: Vec<ScoredBox> = Vec::new();
    let mut suppressed = vec![false; boxes.len()];
    for i in 0..boxes.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(boxes[i]);
        for j in (i + 1)..boxes.len() {
            if !suppressed[j] && boxes[i].rect.iou(&boxes[j].rect) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn generate_anchors(width: usize, height: usize) -> Vec<(f32, f32, f32, f32)> {
    let shrinkage_list = [8, 16, 32, 64];
    let min_boxes: [&[f32]; 4] = [
        &[10.0, 16.0, 24.0],
        &[32.0, 48.0],
        &[64.0, 96.0],
        &[128.0, 192.0, 256.0],
    ];
    let mut anchors = Vec::new();

    let w = width as f32;
    let h = height as f32;

    for (i, &shrinkage) in shrinkage_list.iter().enumerate() {
        let feature_h = (h / shrinkage as f32).ceil() as usize;
        let feature_w = (w / shrinkage as f32).ceil() as usize;

        for v in 0..feature_h {
            for u in 0..feature_w {
                let cx = (u as f32 * shrinkage as f32 + shrinkage as f32 / 2.0) / w;
                let cy = (v as f32 * shrinkage as f32 + shrinkage as f32 / 2.0) / h;

                for &min_box in min_boxes[i] {
                    anchors.push((cx, cy, min_box / w, min_box / h));
                }
            }
        }
    }
    anchors
}
