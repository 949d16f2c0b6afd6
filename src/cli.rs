// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Listing available cameras
//! - Interactive dataset capture
//! - Motion detection

use data_collection::backends::camera::{
    self, DirectorySource, FrameSource, enumerate_cameras,
};
use data_collection::config::{Config, DetectOverrides};
use data_collection::pipelines::encoding::JpegWriter;
use data_collection::pipelines::motion::{
    ConsoleObserver, DetectionOptions, DetectorConfig, MotionDetector, MotionRecorder, StopReason,
    run_detection,
};
use data_collection::terminal;
use data_collection::terminal::collect::CaptureForm;
use data_collection::terminal::motion::MaskPreview;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Device: {}", camera.path);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }
        println!();
    }

    Ok(())
}

/// Values used to prefill the capture form
#[derive(Debug, Default)]
pub struct CollectArgs {
    pub camera: Option<usize>,
    pub output: Option<PathBuf>,
    pub datasets: Option<u32>,
    pub images: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Run the interactive dataset capture tool
pub fn collect(args: CollectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    config.merge_collect(args.camera, args.output);

    let prefill = [args.datasets, args.images, args.width, args.height]
        .map(|value| value.map(|v| v.to_string()).unwrap_or_default());

    terminal::collect::run(&config, CaptureForm::with_values(prefill))
}

/// `detect` options
#[derive(Debug, Default)]
pub struct DetectArgs {
    pub overrides: DetectOverrides,
    pub source: Option<PathBuf>,
    pub looping: bool,
    pub preview: bool,
}

/// Save frames that differ from their predecessor by more than the threshold
pub fn detect(args: DetectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    config.merge_detect(args.overrides);
    let settings = &config.motion;

    let mut source: Box<dyn FrameSource> = match &args.source {
        Some(dir) => {
            let replay = DirectorySource::open(dir)?.looping(args.looping);
            println!("Replaying {} images from {}", replay.len(), dir.display());
            Box::new(replay)
        }
        None => {
            gstreamer::init()?;
            match camera::open_camera(config.camera_index) {
                Ok(camera) => Box::new(camera),
                Err(e) => {
                    eprintln!("Error: Could not open camera.");
                    return Err(e.into());
                }
            }
        }
    };
    println!("Using source: {}", source.name());

    let recorder = MotionRecorder::new(&settings.output_dir, JpegWriter::new(config.jpeg_quality))?;
    let mut detector = MotionDetector::new(DetectorConfig::from(settings));
    let options = DetectionOptions::from(settings);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();
    ctrlc::set_handler(move || {
        stop_clone.store(true, Ordering::SeqCst);
    })?;

    let rt = tokio::runtime::Runtime::new()?;
    let summary = if args.preview {
        let mut tui = terminal::init()?;
        let summary = {
            let mut preview = MaskPreview::new(&mut tui, stop.clone(), settings.threshold);
            rt.block_on(run_detection(
                &mut source,
                &mut detector,
                &recorder,
                options,
                stop,
                &mut preview,
            ))
        };
        terminal::restore(&mut tui)?;
        summary
    } else {
        println!("Watching for motion... (press Ctrl+C to stop)");
        rt.block_on(run_detection(
            &mut source,
            &mut detector,
            &recorder,
            options,
            stop,
            &mut ConsoleObserver::stdout(),
        ))
    };

    if let StopReason::ReadFailed(_) = summary.reason {
        eprintln!("Error: Could not read from camera.");
    }
    println!(
        "Compared {} frames, saved {} snapshots to {}",
        summary.frames,
        summary.detections,
        recorder.output_dir().display()
    );

    Ok(())
}
