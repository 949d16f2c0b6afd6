// SPDX-License-Identifier: GPL-3.0-only

//! Motion detection by frame differencing
//!
//! Each frame is reduced to grayscale and compared with the previous one.
//! Pixels whose absolute difference exceeds `pixel_threshold` are marked
//! in a binary mask; when more than `threshold` pixels changed the colour
//! frame is saved as `motion_<YYYYMMDD_HHMMSS>.jpg`.

use super::encoding::JpegWriter;
use crate::backends::camera::{CameraFrame, FrameSource};
use crate::config::MotionSettings;
use crate::constants::{encoding, motion, timing};
use crate::errors::{AppResult, CameraError, CaptureError};
use chrono::{DateTime, Local};
use image::{GrayImage, Luma, RgbImage};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Mask value of a changed pixel
pub const CHANGED: u8 = 255;

/// Detector thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Changed-pixel count a frame must exceed
    pub threshold: u64,
    /// Difference a pixel must exceed to count as changed
    pub pixel_threshold: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: motion::DEFAULT_THRESHOLD,
            pixel_threshold: motion::DEFAULT_PIXEL_THRESHOLD,
        }
    }
}

impl From<&MotionSettings> for DetectorConfig {
    fn from(settings: &MotionSettings) -> Self {
        Self {
            threshold: settings.threshold,
            pixel_threshold: settings.pixel_threshold,
        }
    }
}

/// Comparison of one frame against its predecessor
#[derive(Debug, Clone)]
pub struct MotionReport {
    /// Number of pixels marked in `mask`
    pub changed_pixels: u64,
    /// `changed_pixels > threshold`
    pub motion: bool,
    /// Binary difference image: [`CHANGED`] or 0 per pixel
    pub mask: GrayImage,
}

/// BT.601 luma, rounded to nearest
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (src, dst) in image.pixels().zip(gray.pixels_mut()) {
        let [r, g, b] = src.0;
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000;
        *dst = Luma([luma as u8]);
    }
    gray
}

/// Binary mask of pixels whose difference strictly exceeds `pixel_threshold`
///
/// Both images must have the same dimensions.
pub fn difference_mask(previous: &GrayImage, current: &GrayImage, pixel_threshold: u8) -> GrayImage {
    debug_assert_eq!(previous.dimensions(), current.dimensions());
    let (width, height) = current.dimensions();
    let mut mask = GrayImage::new(width, height);
    for ((prev, cur), dst) in previous
        .pixels()
        .zip(current.pixels())
        .zip(mask.pixels_mut())
    {
        if prev[0].abs_diff(cur[0]) > pixel_threshold {
            *dst = Luma([CHANGED]);
        }
    }
    mask
}

/// Count of [`CHANGED`] pixels in a mask
pub fn count_changed(mask: &GrayImage) -> u64 {
    mask.as_raw().iter().filter(|&&v| v == CHANGED).count() as u64
}

/// Stateful detector holding the previous grayscale frame
#[derive(Debug, Clone)]
pub struct MotionDetector {
    config: DetectorConfig,
    previous: Option<GrayImage>,
}

impl MotionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            previous: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Whether a reference frame has been recorded
    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }

    /// Compare `frame` with the previous one and make it the new reference
    ///
    /// Returns `None` for the first frame and after a size change, since
    /// there is nothing comparable to diff against.
    pub fn process(&mut self, frame: &RgbImage) -> Option<MotionReport> {
        let current = to_grayscale(frame);

        let previous = match self.previous.take() {
            Some(previous) if previous.dimensions() == current.dimensions() => previous,
            Some(previous) => {
                warn!(
                    from = ?previous.dimensions(),
                    to = ?current.dimensions(),
                    "Frame size changed, resetting reference"
                );
                self.previous = Some(current);
                return None;
            }
            None => {
                self.previous = Some(current);
                return None;
            }
        };

        let mask = difference_mask(&previous, &current, self.config.pixel_threshold);
        let changed_pixels = count_changed(&mask);
        self.previous = Some(current);

        Some(MotionReport {
            changed_pixels,
            motion: changed_pixels > self.config.threshold,
            mask,
        })
    }
}

/// Writes motion snapshots into one folder
#[derive(Debug, Clone)]
pub struct MotionRecorder {
    output_dir: PathBuf,
    writer: JpegWriter,
}

impl MotionRecorder {
    /// Create the recorder, creating `output_dir` if needed
    pub fn new(output_dir: impl Into<PathBuf>, writer: JpegWriter) -> AppResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir, writer })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path for a snapshot taken at `now`
    ///
    /// Captures within the same second get `_1`, `_2`, ... appended rather
    /// than overwriting each other.
    pub fn snapshot_path(&self, now: DateTime<Local>) -> PathBuf {
        let stem = format!(
            "{}{}",
            motion::FILE_PREFIX,
            now.format(motion::TIMESTAMP_FORMAT)
        );

        let mut path = self
            .output_dir
            .join(format!("{}.{}", stem, encoding::EXTENSION));
        let mut suffix = 1;
        while path.exists() {
            path = self
                .output_dir
                .join(format!("{}_{}.{}", stem, suffix, encoding::EXTENSION));
            suffix += 1;
        }
        path
    }

    /// Save `frame` as the snapshot for `now`
    pub async fn save(&self, frame: RgbImage, now: DateTime<Local>) -> Result<PathBuf, CaptureError> {
        let path = self.snapshot_path(now);
        self.writer.save(frame, path).await
    }
}

/// Detection loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionOptions {
    /// Sleep between frames
    pub interval: Duration,
    /// How long a single frame read may take
    pub frame_timeout: Duration,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(motion::DEFAULT_INTERVAL_MS),
            frame_timeout: timing::FRAME_TIMEOUT,
        }
    }
}

impl From<&MotionSettings> for DetectionOptions {
    fn from(settings: &MotionSettings) -> Self {
        Self {
            interval: settings.interval(),
            ..Self::default()
        }
    }
}

/// Why the loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Stop flag was raised (Ctrl+C, `q` in the preview)
    Requested,
    /// A recorded source ran out of frames
    EndOfStream,
    /// The camera stopped delivering frames
    ReadFailed(CameraError),
}

/// Totals for a finished detection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionSummary {
    /// Frames compared against a reference; the priming frame is not counted
    pub frames: u64,
    pub detections: u64,
    pub saved: Vec<PathBuf>,
    pub reason: StopReason,
}

/// Receives every comparison, e.g. to draw the mask
pub trait DetectionObserver {
    /// Called after each compared frame; `saved` is set when a snapshot was written
    fn on_report(&mut self, report: &MotionReport, saved: Option<&Path>);
}

/// Prints a line for every saved snapshot
pub struct ConsoleObserver<W> {
    out: W,
}

impl ConsoleObserver<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DetectionObserver for ConsoleObserver<W> {
    fn on_report(&mut self, _report: &MotionReport, saved: Option<&Path>) {
        let Some(path) = saved else {
            return;
        };
        if let Err(e) = writeln!(self.out, "Motion detected! Image saved at: {}", path.display()) {
            warn!(error = %e, "Failed to print snapshot path");
        }
    }
}

/// Run the detection loop until `stop` is raised or the source fails
pub async fn run_detection<S, O>(
    source: &mut S,
    detector: &mut MotionDetector,
    recorder: &MotionRecorder,
    options: DetectionOptions,
    stop: Arc<AtomicBool>,
    observer: &mut O,
) -> DetectionSummary
where
    S: FrameSource + ?Sized,
    O: DetectionObserver + ?Sized,
{
    info!(
        source = source.name(),
        threshold = detector.config().threshold,
        pixel_threshold = detector.config().pixel_threshold,
        interval_ms = options.interval.as_millis() as u64,
        output = %recorder.output_dir().display(),
        "Starting motion detection"
    );

    let mut frames = 0u64;
    let mut saved = Vec::new();

    let reason = loop {
        if stop.load(Ordering::SeqCst) {
            break StopReason::Requested;
        }

        let frame = match source.next_frame(options.frame_timeout) {
            Ok(frame) => frame,
            Err(CameraError::EndOfStream) => break StopReason::EndOfStream,
            Err(e) => {
                error!(error = %e, "Could not read from camera");
                break StopReason::ReadFailed(e);
            }
        };

        // Malformed frames still wait out the interval below
        if let Some(image) = frame_to_image(&frame)
            && let Some(report) = detector.process(&image)
        {
            frames += 1;
            debug!(changed = report.changed_pixels, motion = report.motion, "Compared frame");

            let mut saved_path = None;
            if report.motion {
                match recorder.save(image, Local::now()).await {
                    Ok(path) => saved_path = Some(path),
                    Err(e) => error!(error = %e, "Failed to save motion snapshot"),
                }
            }

            observer.on_report(&report, saved_path.as_deref());
            if let Some(path) = saved_path {
                saved.push(path);
            }
        }

        if stop.load(Ordering::SeqCst) {
            break StopReason::Requested;
        }
        if !options.interval.is_zero() {
            tokio::time::sleep(options.interval).await;
        }
    };

    info!(frames, detections = saved.len(), ?reason, "Motion detection stopped");
    DetectionSummary {
        frames,
        detections: saved.len() as u64,
        saved,
        reason,
    }
}

fn frame_to_image(frame: &CameraFrame) -> Option<RgbImage> {
    match frame.to_rgb_image() {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(error = %e, "Skipping malformed frame");
            None
        }
    }
}
