use colored::*;
use image::imageops;
use image::ImageReader;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Camera,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::types::RgbFrame;

/// Left and right views captured at the same instant, same size.
#[derive(Debug, Clone)]
pub struct StereoFrame {
    pub left: RgbFrame,
    pub right: RgbFrame,
}

impl StereoFrame {
    pub fn new(left: RgbFrame, right: RgbFrame) -> Result<Self> {
        if left.dimensions() != right.dimensions() {
            return Err(Error::MismatchedViews {
                left: left.dimensions(),
                right: right.dimensions(),
            });
        }
        Ok(Self { left, right })
    }

    pub fn width(&self) -> u32 {
        self.left.width()
    }

    pub fn height(&self) -> u32 {
        self.left.height()
    }
}

/// Anything that yields stereo pairs. `Ok(None)` means the stream ended.
pub trait FrameSource {
    fn name(&self) -> String;
    fn next_pair(&mut self) -> Result<Option<StereoFrame>>;
}

/// Width of a side-by-side frame holding two `view_width` views.
pub fn pair_width(view_width: u32, view_height: u32) -> Result<u32> {
    match view_width.checked_mul(2) {
        Some(w) if view_width > 0 && view_height > 0 => Ok(w),
        _ => Err(Error::InvalidResolution {
            width: view_width,
            height: view_height,
        }),
    }
}

/// Split a side-by-side rig frame into two `view_width`-wide halves.
/// The frame must be exactly two views wide.
pub fn split_side_by_side(frame: &RgbFrame, view_width: u32) -> Result<StereoFrame> {
    let height = frame.height();
    let expected = pair_width(view_width, height)?;
    if frame.width() != expected {
        return Err(Error::FrameWidthMismatch {
            frame_width: frame.width(),
            expected,
        });
    }
    let left = imageops::crop_imm(frame, 0, 0, view_width, height).to_image();
    let right = imageops::crop_imm(frame, view_width, 0, view_width, height).to_image();
    StereoFrame::new(left, right)
}

/// Consecutive failed captures tolerated before the stream is treated as ended.
pub const MAX_CAPTURE_FAILURES: usize = 3;

/// Run `capture` until it succeeds, giving up after `attempts` failures in a row.
pub fn capture_with_retry<F>(attempts: usize, mut capture: F) -> Option<RgbFrame>
where
    F: FnMut() -> Result<RgbFrame>,
{
    for attempt in 1..=attempts {
        match capture() {
            Ok(frame) => return Some(frame),
            Err(e) if attempt < attempts => {
                warn!(error = %e, attempt, "frame capture failed, retrying");
            }
            Err(e) => {
                error!(error = %e, attempts, "frame capture failed repeatedly, ending stream");
            }
        }
    }
    None
}

/// Dual-sensor camera delivering both views in one side-by-side frame.
pub struct CameraSource {
    camera: Camera,
    view_width: u32,
    view_height: u32,
    frame_width: u32,
}

impl CameraSource {
    pub fn new(index: u32, view_width: u32, view_height: u32) -> Result<Self> {
        let frame_width = pair_width(view_width, view_height)?;
        let cam_index = CameraIndex::Index(index);
        let format = CameraFormat::new(
            Resolution::new(frame_width, view_height),
            FrameFormat::MJPEG,
            30,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));
        let mut camera =
            Camera::new(cam_index, requested).map_err(|e| Error::Camera(e.to_string()))?;

        camera
            .open_stream()
            .map_err(|e| Error::Camera(format!("failed to open stream: {e}")))?;

        println!("{}", format!("Opened camera: {}", camera.info().human_name()).green());
        info!(format = %camera.camera_format(), view_width, view_height, "capture pipeline ready");

        let resolution = camera.resolution();
        if resolution.width() < frame_width {
            warn!(
                got = resolution.width(),
                want = frame_width,
                "camera resolution narrower than two views"
            );
        }

        Ok(Self {
            camera,
            view_width,
            view_height,
            frame_width,
        })
    }

    pub fn view_size(&self) -> (u32, u32) {
        (self.view_width, self.view_height)
    }

    /// Size of the composite side-by-side frame.
    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.view_height)
    }

    /// Capture one full side-by-side frame, resized to exactly two views.
    pub fn capture_raw(&mut self) -> Result<RgbFrame> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| Error::Camera(format!("failed to get frame: {e}")))?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::Camera(format!("failed to decode frame: {e}")))?;
        let (w, h) = self.frame_size();
        if decoded.dimensions() == (w, h) {
            Ok(decoded)
        } else {
            Ok(imageops::resize(&decoded, w, h, imageops::FilterType::Triangle))
        }
    }
}

impl FrameSource for CameraSource {
    fn name(&self) -> String {
        self.camera.info().human_name()
    }

    fn next_pair(&mut self) -> Result<Option<StereoFrame>> {
        let Some(raw) = capture_with_retry(MAX_CAPTURE_FAILURES, || self.capture_raw()) else {
            return Ok(None);
        };
        split_side_by_side(&raw, self.view_width).map(Some)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!(error = %e, "failed to stop camera stream");
        }
        info!("camera released");
    }
}

enum PairInput {
    Separate { left: PathBuf, right: PathBuf },
    SideBySide { path: PathBuf },
}

/// Replays a single stereo pair from disk, then reports end of stream.
pub struct ImagePairSource {
    input: PairInput,
    done: bool,
}

impl ImagePairSource {
    pub fn separate(left: impl AsRef<Path>, right: impl AsRef<Path>) -> Self {
        Self {
            input: PairInput::Separate {
                left: left.as_ref().to_path_buf(),
                right: right.as_ref().to_path_buf(),
            },
            done: false,
        }
    }

    pub fn side_by_side(path: impl AsRef<Path>) -> Self {
        Self {
            input: PairInput::SideBySide {
                path: path.as_ref().to_path_buf(),
            },
            done: false,
        }
    }

    fn load(path: &Path) -> Result<RgbFrame> {
        Ok(ImageReader::open(path)?.decode()?.to_rgb8())
    }
}

impl FrameSource for ImagePairSource {
    fn name(&self) -> String {
        match &self.input {
            PairInput::Separate { left, right } => {
                format!("{} | {}", left.display(), right.display())
            }
            PairInput::SideBySide { path } => path.display().to_string(),
        }
    }

    fn next_pair(&mut self) -> Result<Option<StereoFrame>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let frame = match &self.input {
            PairInput::Separate { left, right } => {
                StereoFrame::new(Self::load(left)?, Self::load(right)?)?
            }
            PairInput::SideBySide { path } => {
                let full = Self::load(path)?;
                let half = full.width() / 2;
                split_side_by_side(&full, half)?
            }
        };
        Ok(Some(frame))
    }
}
