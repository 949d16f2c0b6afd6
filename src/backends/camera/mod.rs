// SPDX-License-Identifier: MPL-2.0

//! Camera backend
//!
//! Both tools consume frames through the [`FrameSource`] trait:
//!
//! - [`CameraPipeline`]: live V4L2 camera through a GStreamer pipeline
//! - [`DirectorySource`]: replays recorded images from a folder

pub mod directory;
pub mod enumeration;
pub mod pipeline;
pub mod types;

pub use directory::DirectorySource;
pub use enumeration::enumerate_cameras;
pub use pipeline::CameraPipeline;
pub use types::*;

use crate::errors::CameraError;
use std::time::Duration;
use tracing::info;

/// Anything that can hand out frames one at a time
pub trait FrameSource {
    /// Human readable source name for logs and the status line
    fn name(&self) -> &str;

    /// Return the newest available frame, waiting up to `timeout`
    fn next_frame(&mut self, timeout: Duration) -> Result<CameraFrame, CameraError>;

    /// Ask the source for frames at least `width` x `height`
    ///
    /// Best effort: sources that cannot honour the request keep streaming
    /// at their current size.
    fn request_resolution(&mut self, width: u32, height: u32) -> Result<(), CameraError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn next_frame(&mut self, timeout: Duration) -> Result<CameraFrame, CameraError> {
        (**self).next_frame(timeout)
    }

    fn request_resolution(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        (**self).request_resolution(width, height)
    }
}

/// Open the camera at `index` in the [`enumerate_cameras`] list
pub fn open_camera(index: usize) -> Result<CameraPipeline, CameraError> {
    let cameras = enumerate_cameras();
    let device = select_device(&cameras, index)?;

    info!(device = %device, "Opening camera");
    CameraPipeline::new(device)
}

/// Pick `index` out of `cameras`; a missing camera is unavailable
pub fn select_device(cameras: &[CameraDevice], index: usize) -> Result<&CameraDevice, CameraError> {
    if cameras.is_empty() {
        return Err(CameraError::Unavailable("no camera devices found".to_string()));
    }
    cameras.get(index).ok_or_else(|| {
        CameraError::Unavailable(format!(
            "no camera at index {} ({} available)",
            index,
            cameras.len()
        ))
    })
}
