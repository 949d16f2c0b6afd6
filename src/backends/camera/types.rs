// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for frame sources

use crate::errors::CaptureError;
use image::RgbImage;
use std::sync::Arc;

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human readable name (V4L2 card name)
    pub name: String,
    /// Device node, e.g. `/dev/video0`
    pub path: String,
    /// V4L2 device index
    pub index: usize,
    /// Kernel driver, e.g. `uvcvideo`
    pub driver: Option<String>,
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// A single RGB24 frame
///
/// Rows may carry padding when they come straight from GStreamer, so
/// `stride` is the byte length of one row in `data`.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub stride: u32,
}

impl CameraFrame {
    /// Wrap a decoded image as a frame
    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: Arc::from(image.into_raw().into_boxed_slice()),
            stride: width * 3,
        }
    }

    /// Copy the frame into a tightly packed [`RgbImage`]
    pub fn to_rgb_image(&self) -> Result<RgbImage, CaptureError> {
        let row_len = self.width as usize * 3;
        let stride = self.stride as usize;
        if stride < row_len {
            return Err(CaptureError::InvalidFrame(format!(
                "stride {} shorter than row of {} bytes",
                stride, row_len
            )));
        }

        let needed = stride * self.height.saturating_sub(1) as usize + row_len;
        if self.height > 0 && self.data.len() < needed {
            return Err(CaptureError::InvalidFrame(format!(
                "{} bytes for {}x{} (stride {})",
                self.data.len(),
                self.width,
                self.height,
                self.stride
            )));
        }

        let pixels = if stride == row_len {
            self.data[..row_len * self.height as usize].to_vec()
        } else {
            let mut packed = Vec::with_capacity(row_len * self.height as usize);
            for row in self.data.chunks(stride).take(self.height as usize) {
                packed.extend_from_slice(&row[..row_len]);
            }
            packed
        };

        RgbImage::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| CaptureError::InvalidFrame("buffer size mismatch".to_string()))
    }
}

/// Frame sender used by the GStreamer appsink callback
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_packed_frame() {
        let image = RgbImage::from_fn(4, 2, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let frame = CameraFrame::from_rgb_image(image.clone());
        assert_eq!(frame.stride, 12);
        assert_eq!(frame.to_rgb_image().unwrap(), image);
    }

    #[test]
    fn test_padded_rows_are_stripped() {
        // 2x2 frame with 8-byte rows (2 bytes of padding each)
        let data: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data.into_boxed_slice()),
            stride: 8,
        };

        let image = frame.to_rgb_image().unwrap();
        assert_eq!(image.into_raw(), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let frame = CameraFrame {
            width: 4,
            height: 4,
            data: Arc::from(vec![0u8; 10].into_boxed_slice()),
            stride: 12,
        };
        assert!(matches!(
            frame.to_rgb_image(),
            Err(CaptureError::InvalidFrame(_))
        ));
    }
}
