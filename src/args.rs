use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Distance to a face from a side-by-side stereo camera", long_about = None)]
pub struct Args {
    /// Input camera identifier
    #[arg(short, long, default_value_t = 0)]
    pub input: u32,

    /// Capture width of one view in pixels
    #[arg(short = 'W', long, default_value_t = 640, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Capture height in pixels
    #[arg(short = 'H', long, default_value_t = 480, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Face detector score threshold, in (0, 1]
    #[arg(short = 'd', long = "detthreshold", default_value_t = 0.55, value_parser = unit_interval)]
    pub det_threshold: f32,

    /// Face detector NMS IoU threshold, in (0, 1]
    #[arg(short = 'n', long = "nmsthreshold", default_value_t = 0.35, value_parser = unit_interval)]
    pub nms_threshold: f32,

    /// JSON configuration file (created with defaults if missing)
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Show both views without running detection
    #[arg(long)]
    pub passthrough: bool,

    /// List available cameras
    #[arg(long)]
    pub list: bool,
}

/// Parse a threshold that must lie in (0, 1].
pub fn unit_interval(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("{value} is outside (0, 1]"))
    }
}
