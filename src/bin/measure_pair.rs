//! Measure the distance to a face in a stereo image pair stored on disk.
//!
//! Usage:
//!   measure_pair --left l.png --right r.png           # JSON to stdout
//!   measure_pair --pair sbs.png --mode landmark -l 0  # side-by-side input
//!   measure_pair --pair sbs.png --save annotated.png

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stereo_face_distance::annotation::Annotator;
use stereo_face_distance::args::unit_interval;
use stereo_face_distance::camera::ImagePairSource;
use stereo_face_distance::detector::{DetectorThresholds, FaceDetector};
use stereo_face_distance::landmark::LandmarkEstimator;
use stereo_face_distance::{
    AppConfig, FrameSource, InteractionState, LandmarkIndex, SelectionMode, StereoPipeline,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Centroid,
    Landmark,
}

#[derive(Parser, Debug)]
#[command(name = "measure_pair")]
#[command(author, version, about = "Stereo face distance for a single image pair", long_about = None)]
struct Args {
    /// Left view image
    #[arg(long, requires = "right", conflicts_with = "pair")]
    left: Option<PathBuf>,

    /// Right view image
    #[arg(long, requires = "left")]
    right: Option<PathBuf>,

    /// Side-by-side image holding both views
    #[arg(long)]
    pair: Option<PathBuf>,

    /// Reference point selection
    #[arg(long, value_enum, default_value_t = Mode::Centroid)]
    mode: Mode,

    /// Landmark used in landmark mode (0-4)
    #[arg(short, long, default_value_t = 2)]
    landmark_index: usize,

    #[arg(short = 'd', long = "detthreshold", default_value_t = 0.55, value_parser = unit_interval)]
    det_threshold: f32,

    #[arg(short = 'n', long = "nmsthreshold", default_value_t = 0.35, value_parser = unit_interval)]
    nms_threshold: f32,

    /// JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Write the annotated composite image here
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut source = match (&args.left, &args.right, &args.pair) {
        (Some(l), Some(r), None) => ImagePairSource::separate(l, r),
        (None, None, Some(p)) => ImagePairSource::side_by_side(p),
        _ => bail!("pass either --left and --right, or --pair"),
    };

    let Some(landmark_index) = LandmarkIndex::new(args.landmark_index) else {
        bail!("--landmark-index must be in 0..5, got {}", args.landmark_index);
    };

    let config = AppConfig::load(&args.config)?;
    let thresholds = DetectorThresholds::new(args.det_threshold, args.nms_threshold)?;

    let frame = source
        .next_pair()?
        .with_context(|| format!("no frame in {}", source.name()))?;
    info!(source = %source.name(), width = frame.width(), height = frame.height(), "loaded pair");

    let detector = FaceDetector::new(&config.models.face_detection_path, config.models.detector_input, thresholds)?;
    let landmarks = LandmarkEstimator::new(&config.models.face_landmark_path, config.models.landmark_input)?;
    let mut pipeline = StereoPipeline::new(detector, landmarks, config.calibration);

    let mut state = InteractionState::default();
    state.mode = match args.mode {
        Mode::Centroid => SelectionMode::Centroid,
        Mode::Landmark => SelectionMode::Landmark,
    };
    state.landmark_index = landmark_index;

    let analysis = pipeline.process(&frame, &state)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);

    if let Some(path) = &args.save {
        let composite = Annotator::new(config.ui.clone()).compose(&frame, &analysis, &state);
        composite
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "saved annotated pair");
    }

    Ok(())
}
