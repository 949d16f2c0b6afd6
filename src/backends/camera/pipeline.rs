// SPDX-License-Identifier: MPL-2.0

//! GStreamer camera pipeline
//!
//! ```text
//! v4l2src ! capsfilter(src_caps) ! decodebin ! videoconvert ! videoscale
//!         ! video/x-raw,format=RGB ! appsink
//! ```
//!
//! `decodebin` covers both raw (YUYV) and MJPEG cameras. The `src_caps`
//! filter is the knob [`FrameSource::request_resolution`] turns.

use super::FrameSource;
use super::types::{CameraDevice, CameraFrame, FrameSender};
use crate::constants::{pipeline, timing};
use crate::errors::CameraError;
use futures::channel::mpsc;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Caps that accept whatever the camera offers
const ANY_SOURCE_CAPS: &str = "video/x-raw;image/jpeg";

/// Live camera feeding RGB frames through an appsink
pub struct CameraPipeline {
    name: String,
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    src_caps: gstreamer::Element,
    receiver: mpsc::Receiver<CameraFrame>,
}

impl CameraPipeline {
    /// Build and start a pipeline for `device`
    pub fn new(device: &CameraDevice) -> Result<Self, CameraError> {
        gstreamer::init()?;

        let description = build_pipeline_string(&device.path);
        info!(device = %device, pipeline = %description, "Creating camera pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CameraError::Unavailable(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| CameraError::BackendError("Failed to cast to pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::BackendError("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| CameraError::BackendError("Failed to cast appsink".to_string()))?;

        let src_caps = pipeline
            .by_name("src_caps")
            .ok_or_else(|| CameraError::BackendError("Failed to get caps filter".to_string()))?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let (sender, receiver) = mpsc::channel(pipeline::CHANNEL_CAPACITY);
        install_frame_callback(&appsink, FrameQueue::new(sender));

        let camera = Self {
            name: device.name.clone(),
            pipeline,
            appsink,
            src_caps,
            receiver,
        };
        camera.start()?;

        Ok(camera)
    }

    fn start(&self) -> Result<(), CameraError> {
        self.pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| {
                self.log_bus_errors();
                CameraError::Unavailable(format!("Failed to start pipeline: {}", e))
            })?;

        let (result, state, pending) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(?result, ?state, ?pending, "Pipeline state");

        match result {
            Ok(_) if state == gstreamer::State::Playing => Ok(()),
            // Live sources may still be negotiating; frames arrive once ready
            Ok(gstreamer::StateChangeSuccess::Async) if pending == gstreamer::State::Playing => {
                Ok(())
            }
            _ => {
                self.log_bus_errors();
                let _ = self.pipeline.set_state(gstreamer::State::Null);
                Err(CameraError::Unavailable(format!(
                    "Pipeline failed to start (state: {:?}, result: {:?})",
                    state, result
                )))
            }
        }
    }

    fn stop(&mut self) {
        let _ = self.pipeline.set_state(gstreamer::State::Null);
        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        debug!(?result, ?state, "Pipeline stopped");

        // Frames queued before a renegotiation have the old size
        while self.receiver.try_recv().is_ok() {}
    }

    fn set_source_caps(&self, caps: &str) -> Result<(), CameraError> {
        let caps = gstreamer::Caps::from_str(caps)
            .map_err(|e| CameraError::BackendError(format!("Invalid caps {}: {}", caps, e)))?;
        self.src_caps.set_property("caps", &caps);
        Ok(())
    }

    fn log_bus_errors(&self) {
        let Some(bus) = self.pipeline.bus() else {
            return;
        };
        while let Some(msg) = bus.pop() {
            if let gstreamer::MessageView::Error(err) = msg.view() {
                error!(
                    source = ?err.src().map(|s| s.path_string()),
                    error = %err.error(),
                    debug = ?err.debug(),
                    "GStreamer error"
                );
            }
        }
    }
}

impl FrameSource for CameraPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self, timeout: Duration) -> Result<CameraFrame, CameraError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Drain everything queued so the newest frame wins
            let mut latest = None;
            while let Ok(frame) = self.receiver.try_recv() {
                latest = Some(frame);
            }
            if let Some(frame) = latest {
                return Ok(frame);
            }

            if Instant::now() >= deadline {
                self.log_bus_errors();
                return Err(CameraError::ReadFailed);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn request_resolution(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        let caps = minimum_size_caps(width, height);
        info!(width, height, caps = %caps, "Requesting camera resolution");

        self.stop();
        self.set_source_caps(&caps)?;
        if let Err(e) = self.start() {
            warn!(error = %e, "Camera rejected requested resolution, keeping default size");
            self.stop();
            self.set_source_caps(ANY_SOURCE_CAPS)?;
            self.start()?;
        }
        Ok(())
    }
}

impl Drop for CameraPipeline {
    fn drop(&mut self) {
        info!(camera = %self.name, "Releasing camera");
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

/// Full `gst-launch` description for a V4L2 device
fn build_pipeline_string(device_path: &str) -> String {
    format!(
        "v4l2src device={} do-timestamp=true ! \
         capsfilter name=src_caps caps=\"{}\" ! \
         decodebin ! \
         videoconvert n-threads={} ! \
         videoscale ! \
         video/x-raw,format=RGB ! \
         appsink name=sink",
        device_path,
        ANY_SOURCE_CAPS,
        pipeline::videoconvert_threads()
    )
}

/// Caps asking the device for at least `width` x `height`, raw or MJPEG
fn minimum_size_caps(width: u32, height: u32) -> String {
    let max = i32::MAX;
    format!(
        "video/x-raw,width=(int)[{w},{max}],height=(int)[{h},{max}];\
         image/jpeg,width=(int)[{w},{max}],height=(int)[{h},{max}]",
        w = width,
        h = height,
        max = max
    )
}

/// What happened to a frame handed to [`FrameQueue::push`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Queued,
    /// Channel full; the consumer drains to the newest frame anyway
    Dropped,
    /// Receiver is gone
    Closed,
}

/// The one producer side of the frame channel
///
/// A futures channel grants every `Sender` clone its own extra slot, so the
/// streaming thread must keep reusing this single sender for
/// `CHANNEL_CAPACITY` to bound the queue.
struct FrameQueue {
    sender: Mutex<FrameSender>,
}

impl FrameQueue {
    fn new(sender: FrameSender) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }

    fn push(&self, frame: CameraFrame) -> Delivery {
        let Ok(mut sender) = self.sender.lock() else {
            return Delivery::Closed;
        };
        match sender.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(e) if e.is_disconnected() => Delivery::Closed,
            Err(_) => Delivery::Dropped,
        }
    }
}

fn install_frame_callback(appsink: &AppSink, queue: FrameQueue) {
    let counter = AtomicU64::new(0);
    appsink.set_callbacks(
        gstreamer_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let frame_num = counter.fetch_add(1, Ordering::Relaxed);

                let sample = appsink
                    .pull_sample()
                    .map_err(|_| gstreamer::FlowError::Eos)?;
                let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                let video_info = VideoInfo::from_caps(caps).map_err(|e| {
                    error!(frame = frame_num, error = ?e, "Failed to get video info");
                    gstreamer::FlowError::Error
                })?;
                let map = buffer.map_readable().map_err(|e| {
                    error!(frame = frame_num, error = ?e, "Failed to map buffer");
                    gstreamer::FlowError::Error
                })?;

                let frame = CameraFrame {
                    width: video_info.width(),
                    height: video_info.height(),
                    data: Arc::from(map.as_slice()),
                    stride: video_info.stride()[0] as u32,
                };

                if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        frame = frame_num,
                        width = frame.width,
                        height = frame.height,
                        stride = frame.stride,
                        "Frame received"
                    );
                }

                match queue.push(frame) {
                    Delivery::Queued => {}
                    Delivery::Dropped => debug!(frame = frame_num, "Frame dropped (channel full)"),
                    Delivery::Closed => return Err(gstreamer::FlowError::Eos),
                }

                Ok(gstreamer::FlowSuccess::Ok)
            })
            .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_string_targets_device() {
        let description = build_pipeline_string("/dev/video2");
        assert!(description.starts_with("v4l2src device=/dev/video2 "));
        assert!(description.contains("name=src_caps"));
        assert!(description.contains("format=RGB"));
        assert!(description.ends_with("appsink name=sink"));
    }

    #[test]
    fn test_minimum_size_caps_cover_raw_and_mjpeg() {
        let caps = minimum_size_caps(640, 640);
        assert!(caps.starts_with("video/x-raw,width=(int)[640,"));
        assert!(caps.contains(";image/jpeg,width=(int)[640,"));
        assert!(caps.contains("height=(int)[640,"));
    }

    fn tiny_frame() -> CameraFrame {
        CameraFrame::from_rgb_image(image::RgbImage::new(2, 2))
    }

    #[test]
    fn test_frame_queue_stays_bounded() {
        let (sender, mut receiver) = mpsc::channel(pipeline::CHANNEL_CAPACITY);
        let queue = FrameQueue::new(sender);

        let queued = (0..300)
            .map(|_| queue.push(tiny_frame()))
            .filter(|delivery| *delivery == Delivery::Queued)
            .count();

        // One sender: buffer plus its single guaranteed slot
        assert_eq!(queued, pipeline::CHANNEL_CAPACITY + 1);
        assert_eq!(queue.push(tiny_frame()), Delivery::Dropped);

        let mut drained = 0;
        while receiver.try_recv().is_ok() {
            drained += 1;
        }
        assert_eq!(drained, queued);

        // Room again once the consumer caught up
        assert_eq!(queue.push(tiny_frame()), Delivery::Queued);
    }

    #[test]
    fn test_frame_queue_reports_closed_receiver() {
        let (sender, receiver) = mpsc::channel(pipeline::CHANNEL_CAPACITY);
        let queue = FrameQueue::new(sender);
        drop(receiver);

        assert_eq!(queue.push(tiny_frame()), Delivery::Closed);
    }
}
