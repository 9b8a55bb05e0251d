use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("{name} must be in (0, 1], got {value}")]
    InvalidThreshold { name: &'static str, value: f32 },

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Invalid capture resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Side-by-side frame is {frame_width} px wide, expected exactly {expected} px")]
    FrameWidthMismatch { frame_width: u32, expected: u32 },

    #[error("Stereo views differ in size: left {left:?}, right {right:?}")]
    MismatchedViews { left: (u32, u32), right: (u32, u32) },

    #[error("Model output has {got} values, expected at least {expected}")]
    UnexpectedModelOutput { got: usize, expected: usize },
}

impl Error {
    /// Wrap an ONNX Runtime failure; session builders and runs use different error types.
    pub fn inference(err: impl std::fmt::Display) -> Self {
        Error::Inference(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
