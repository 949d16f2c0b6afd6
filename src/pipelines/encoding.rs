// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding and file writes
//!
//! The dataset tool writes one file per keypress and does it inline;
//! the motion loop goes through [`JpegWriter::save`] so encoding runs on a
//! blocking task while the loop keeps its pace.

use crate::constants::encoding;
use crate::errors::CaptureError;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// JPEG encoder with a fixed quality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegWriter {
    quality: u8,
}

impl Default for JpegWriter {
    fn default() -> Self {
        Self::new(encoding::DEFAULT_JPEG_QUALITY)
    }
}

impl JpegWriter {
    /// Create a writer; quality is clamped to 1..=100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode `image` as JPEG bytes
    pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>, CaptureError> {
        let mut buffer = Vec::new();
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, self.quality);

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;

        debug!(size = buffer.len(), "JPEG encoding complete");
        Ok(buffer)
    }

    /// Encode and write `image` to `path`, creating parent directories
    pub fn write(&self, image: &RgbImage, path: &Path) -> Result<(), CaptureError> {
        let data = self.encode(image)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)?;
        info!(path = %path.display(), width = image.width(), height = image.height(), "Image saved");
        Ok(())
    }

    /// [`JpegWriter::write`] on a blocking task
    pub async fn save(&self, image: RgbImage, path: PathBuf) -> Result<PathBuf, CaptureError> {
        let writer = *self;
        tokio::task::spawn_blocking(move || {
            writer.write(&image, &path)?;
            Ok(path)
        })
        .await
        .map_err(|e| CaptureError::SaveFailed(format!("Save task error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(JpegWriter::new(0).quality(), 1);
        assert_eq!(JpegWriter::new(250).quality(), 100);
        assert_eq!(JpegWriter::default().quality(), 95);
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("frame.jpg");
        let image = RgbImage::from_pixel(16, 8, Rgb([10, 120, 200]));

        JpegWriter::default().write(&image, &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[tokio::test]
    async fn test_async_save_returns_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("async.jpg");
        let saved = JpegWriter::default()
            .save(RgbImage::new(4, 4), path.clone())
            .await
            .unwrap();
        assert_eq!(saved, path);
        assert!(path.exists());
    }
}
