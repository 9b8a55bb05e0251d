use image::imageops::{self, FilterType};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tracing::info;

use crate::error::{Error, Result};
use crate::pipeline::LandmarkEstimate;
use crate::types::{LandmarkSet, Point, RgbFrame, LANDMARK_COUNT};

/// Five-point face landmark model (eyes, nose tip, mouth corners).
///
/// The model takes an NHWC crop and emits the five x coordinates followed by
/// the five y coordinates, normalized to the crop.
pub struct LandmarkEstimator {
    session: Session,
    input_width: u32,
    input_height: u32,
}

impl LandmarkEstimator {
    pub fn new(model_path: &str, input: (u32, u32)) -> Result<Self> {
        let session = Session::builder()
            .map_err(Error::inference)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(Error::inference)?
            .with_intra_threads(2)
            .map_err(Error::inference)?
            .with_execution_providers([
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])
            .map_err(Error::inference)?
            .commit_from_file(model_path)
            .map_err(Error::inference)?;

        info!(model = model_path, ?input, "landmark estimator loaded");
        Ok(Self {
            session,
            input_width: input.0,
            input_height: input.1,
        })
    }
}

impl LandmarkEstimate for LandmarkEstimator {
    fn name(&self) -> String {
        "Face Landmark (5 pts)".to_string()
    }

    fn estimate(&mut self, crop: &RgbFrame) -> Result<LandmarkSet> {
        let (w, h) = (self.input_width, self.input_height);
        let resized = imageops::resize(crop, w, h, FilterType::Triangle);

        let mut input_data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let pixel = resized.get_pixel(x, y);
                for c in 0..3 {
                    input_data.push((pixel[c] as f32 / 127.5) - 1.0);
                }
            }
        }

        let shape = [1usize, h as usize, w as usize, 3];
        let input = Tensor::from_array((shape, input_data)).map_err(Error::inference)?;
        let outputs = self.session.run(ort::inputs![input]).map_err(Error::inference)?;
        let (_shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(Error::inference)?;

        parse_points(data)
    }
}

/// `[x0..x4, y0..y4]` into a [`LandmarkSet`], clamped to the crop.
pub fn parse_points(data: &[f32]) -> Result<LandmarkSet> {
    if data.len() < LANDMARK_COUNT * 2 {
        return Err(Error::UnexpectedModelOutput {
            got: data.len(),
            expected: LANDMARK_COUNT * 2,
        });
    }
    let points = std::array::from_fn(|i| {
        Point::new(
            data[i].clamp(0.0, 1.0),
            data[LANDMARK_COUNT + i].clamp(0.0, 1.0),
        )
    });
    Ok(LandmarkSet::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_planar_layout() {
        let data = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.5];
        let set = parse_points(&data).unwrap();
        assert_eq!(set.points[0], Point::new(0.1, 0.6));
        assert_eq!(set.points[3], Point::new(0.4, 0.9));
        assert_eq!(set.points[4], Point::new(0.5, 1.0));
    }

    #[test]
    fn short_output_is_an_error() {
        assert!(matches!(
            parse_points(&[0.0; 7]),
            Err(Error::UnexpectedModelOutput { got: 7, expected: 10 })
        ));
    }
}
