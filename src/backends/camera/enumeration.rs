// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera enumeration

use super::types::CameraDevice;
use tracing::{debug, warn};
use v4l::capability::Flags;

/// List V4L2 devices that can capture video, ordered by device index
///
/// Metadata nodes (a second `/dev/videoN` many UVC cameras expose) are
/// skipped because they never produce frames.
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    let mut cameras: Vec<CameraDevice> = v4l::context::enum_devices()
        .into_iter()
        .filter_map(|node| {
            let index = node.index();
            let path = node.path().to_string_lossy().to_string();

            let device = match v4l::Device::new(index) {
                Ok(device) => device,
                Err(e) => {
                    warn!(path, error = %e, "Failed to open V4L2 device");
                    return None;
                }
            };

            let caps = match device.query_caps() {
                Ok(caps) => caps,
                Err(e) => {
                    warn!(path, error = %e, "Failed to query V4L2 capabilities");
                    return None;
                }
            };

            if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                debug!(path, "Skipping non-capture node");
                return None;
            }

            let name = node.name().unwrap_or_else(|| caps.card.clone());
            Some(CameraDevice {
                name,
                path,
                index,
                driver: Some(caps.driver),
            })
        })
        .collect();

    cameras.sort_by_key(|camera| camera.index);
    debug!(count = cameras.len(), "Enumerated cameras");
    cameras
}
