// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the motion detection loop

use data_collection::backends::camera::{CameraFrame, DirectorySource, FrameSource};
use data_collection::errors::CameraError;
use data_collection::pipelines::encoding::JpegWriter;
use data_collection::pipelines::motion::{
    DetectionObserver, DetectionOptions, DetectorConfig, MotionDetector, MotionRecorder,
    MotionReport, StopReason, run_detection,
};
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Frame source backed by a fixed list of images
struct ScriptedSource {
    frames: VecDeque<RgbImage>,
    fail_at_end: bool,
}

impl ScriptedSource {
    fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into(),
            fail_at_end: false,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn next_frame(&mut self, _timeout: Duration) -> Result<CameraFrame, CameraError> {
        match self.frames.pop_front() {
            Some(image) => Ok(CameraFrame::from_rgb_image(image)),
            None if self.fail_at_end => Err(CameraError::ReadFailed),
            None => Err(CameraError::EndOfStream),
        }
    }

    fn request_resolution(&mut self, _width: u32, _height: u32) -> Result<(), CameraError> {
        Ok(())
    }
}

/// Source whose frames never match their declared size
struct CorruptSource {
    remaining: u32,
}

impl FrameSource for CorruptSource {
    fn name(&self) -> &str {
        "corrupt"
    }

    fn next_frame(&mut self, _timeout: Duration) -> Result<CameraFrame, CameraError> {
        if self.remaining == 0 {
            return Err(CameraError::EndOfStream);
        }
        self.remaining -= 1;
        Ok(CameraFrame {
            width: 4,
            height: 4,
            data: Arc::from(vec![0u8; 10].into_boxed_slice()),
            stride: 12,
        })
    }

    fn request_resolution(&mut self, _width: u32, _height: u32) -> Result<(), CameraError> {
        Ok(())
    }
}

/// Records every report it sees
#[derive(Default)]
struct Collector {
    counts: Vec<u64>,
    saved: Vec<PathBuf>,
}

impl DetectionObserver for Collector {
    fn on_report(&mut self, report: &MotionReport, saved: Option<&Path>) {
        self.counts.push(report.changed_pixels);
        if let Some(path) = saved {
            self.saved.push(path.to_path_buf());
        }
    }
}

/// 40x40 dark frame with a bright `size` x `size` block at the origin
fn frame_with_block(size: u32) -> RgbImage {
    RgbImage::from_fn(40, 40, |x, y| {
        if x < size && y < size {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

fn no_wait() -> DetectionOptions {
    DetectionOptions {
        interval: Duration::ZERO,
        frame_timeout: Duration::from_millis(10),
    }
}

fn detector(threshold: u64) -> MotionDetector {
    MotionDetector::new(DetectorConfig {
        threshold,
        pixel_threshold: 30,
    })
}

#[tokio::test]
async fn test_only_frames_over_threshold_are_saved() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = MotionRecorder::new(dir.path().join("changes"), JpegWriter::default()).unwrap();

    // Changes vs previous: 0, 100 (== threshold), 0, 100, 121 (> threshold)
    let mut source = ScriptedSource::new(vec![
        frame_with_block(0),
        frame_with_block(0),
        frame_with_block(10),
        frame_with_block(10),
        frame_with_block(0),
        frame_with_block(11),
    ]);

    let mut collector = Collector::default();
    let summary = run_detection(
        &mut source,
        &mut detector(100),
        &recorder,
        no_wait(),
        Arc::new(AtomicBool::new(false)),
        &mut collector,
    )
    .await;

    assert_eq!(collector.counts, vec![0, 100, 0, 100, 121]);
    // The first frame only primes the reference
    assert_eq!(summary.frames, 5);
    assert_eq!(summary.detections, 1);
    assert_eq!(summary.reason, StopReason::EndOfStream);
    assert_eq!(collector.saved, summary.saved);

    let saved = &summary.saved[0];
    assert!(saved.starts_with(dir.path().join("changes")));
    let name = saved.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("motion_") && name.ends_with(".jpg"), "{}", name);
    assert!(image::open(saved).is_ok());
}

#[tokio::test]
async fn test_read_failure_stops_loop() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = MotionRecorder::new(dir.path(), JpegWriter::default()).unwrap();

    let mut source = ScriptedSource::new(vec![frame_with_block(0)]);
    source.fail_at_end = true;

    let summary = run_detection(
        &mut source,
        &mut detector(500),
        &recorder,
        no_wait(),
        Arc::new(AtomicBool::new(false)),
        &mut Collector::default(),
    )
    .await;

    assert_eq!(summary.frames, 0);
    assert_eq!(summary.reason, StopReason::ReadFailed(CameraError::ReadFailed));
}

#[tokio::test]
async fn test_stop_flag_ends_loop_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = MotionRecorder::new(dir.path(), JpegWriter::default()).unwrap();
    let stop = Arc::new(AtomicBool::new(true));

    let mut source = ScriptedSource::new(vec![frame_with_block(0), frame_with_block(20)]);
    let summary = run_detection(
        &mut source,
        &mut detector(0),
        &recorder,
        no_wait(),
        stop.clone(),
        &mut Collector::default(),
    )
    .await;

    assert!(stop.load(Ordering::SeqCst));
    assert_eq!(summary.frames, 0);
    assert_eq!(summary.reason, StopReason::Requested);
    assert_eq!(source.frames.len(), 2);
}

#[tokio::test]
async fn test_detection_over_recorded_directory() {
    let frames_dir = tempfile::tempdir().unwrap();
    frame_with_block(0).save(frames_dir.path().join("frame_000.png")).unwrap();
    frame_with_block(30).save(frames_dir.path().join("frame_001.png")).unwrap();
    frame_with_block(30).save(frames_dir.path().join("frame_002.png")).unwrap();

    let output = tempfile::tempdir().unwrap();
    let recorder = MotionRecorder::new(output.path(), JpegWriter::default()).unwrap();
    let mut source = DirectorySource::open(frames_dir.path()).unwrap();

    let summary = run_detection(
        &mut source,
        &mut detector(500),
        &recorder,
        no_wait(),
        Arc::new(AtomicBool::new(false)),
        &mut Collector::default(),
    )
    .await;

    // 900 changed pixels on the second frame, none on the third
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.detections, 1);
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_malformed_frames_still_wait_between_reads() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = MotionRecorder::new(dir.path(), JpegWriter::default()).unwrap();
    let interval = Duration::from_millis(20);

    let mut source = CorruptSource { remaining: 3 };
    let mut collector = Collector::default();
    let started = Instant::now();
    let summary = run_detection(
        &mut source,
        &mut detector(0),
        &recorder,
        DetectionOptions {
            interval,
            frame_timeout: Duration::from_millis(10),
        },
        Arc::new(AtomicBool::new(false)),
        &mut collector,
    )
    .await;

    assert!(started.elapsed() >= interval * 3);
    assert_eq!(summary.frames, 0);
    assert!(collector.counts.is_empty());
    assert_eq!(summary.reason, StopReason::EndOfStream);
}
