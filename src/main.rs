use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stereo_face_distance::annotation::{hconcat, Annotator};
use stereo_face_distance::args::Args;
use stereo_face_distance::camera::CameraSource;
use stereo_face_distance::detector::{DetectorThresholds, FaceDetector};
use stereo_face_distance::landmark::LandmarkEstimator;
use stereo_face_distance::output::WindowOutput;
use stereo_face_distance::{
    AppConfig, Control, FaceDetect, FrameSource, InteractionState, KeyEvent, LandmarkEstimate,
    StereoPipeline,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.list {
        let cameras = nokhwa::query(nokhwa::utils::ApiBackend::Auto)?;
        println!("Available Cameras:");
        println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
        println!("{}", "-".repeat(60));
        for cam in cameras {
            println!("{:<5} | {:<30} | {:?}", cam.index(), cam.human_name(), cam.misc());
        }
        return Ok(());
    }

    info!(input = args.input, width = args.width, height = args.height, "capture settings");
    info!(det = args.det_threshold, nms = args.nms_threshold, "face detector thresholds");

    // 0. Config
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let thresholds = DetectorThresholds::new(args.det_threshold, args.nms_threshold)?;
    info!(calibration = ?config.calibration, "calibration");

    // 1. Camera
    let mut camera = CameraSource::new(args.input, args.width, args.height)
        .context("Failed to initialize the capture pipeline")?;

    // 2. Window
    let (frame_width, frame_height) = camera.frame_size();
    let mut window = WindowOutput::new("Stereo Face Detection", frame_width as usize, frame_height as usize)?;

    if args.passthrough {
        return run_passthrough(&mut camera, &mut window);
    }

    // 3. Inference
    let detector = FaceDetector::new(
        &config.models.face_detection_path,
        config.models.detector_input,
        thresholds,
    )
    .context("Failed to load face detector")?;
    let landmarks = LandmarkEstimator::new(&config.models.face_landmark_path, config.models.landmark_input)
        .context("Failed to load face landmark model")?;
    let mut pipeline = StereoPipeline::new(detector, landmarks, config.calibration);
    println!("{}", format!("Active Pipeline: {}", pipeline.name()).green());

    let annotator = Annotator::new(config.ui.clone());
    let mut state = InteractionState::default();

    println!("Controls: [d] Centroid/Landmark  [l] Next Landmark  [q] Quit");
    run_stereo(&mut camera, &mut pipeline, &annotator, &mut window, &mut state)?;

    info!("stopping face detector and landmark estimator");
    drop(pipeline);
    drop(camera);
    Ok(())
}

fn run_stereo<S, D, L>(
    source: &mut S,
    pipeline: &mut StereoPipeline<D, L>,
    annotator: &Annotator,
    window: &mut WindowOutput,
    state: &mut InteractionState,
) -> Result<()>
where
    S: FrameSource,
    D: FaceDetect,
    L: LandmarkEstimate,
{
    while window.is_open() {
        let Some(frame) = source.next_pair()? else {
            warn!("frame source exhausted");
            break;
        };

        let analysis = pipeline.process(&frame, state)?;
        let display = annotator.compose(&frame, &analysis, state);
        window.show(&display)?;

        if let Some(event) = window.poll_event() {
            if state.handle(event) == Control::Quit {
                info!("quit requested");
                break;
            }
        }
    }
    Ok(())
}

fn run_passthrough<S: FrameSource>(source: &mut S, window: &mut WindowOutput) -> Result<()> {
    println!("Dual passthrough. Press [q] to quit.");
    while window.is_open() {
        let Some(frame) = source.next_pair()? else {
            break;
        };
        window.show(&hconcat(&frame.left, &frame.right))?;
        if window.poll_event() == Some(KeyEvent::Quit) {
            break;
        }
    }
    Ok(())
}
