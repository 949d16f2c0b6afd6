// SPDX-License-Identifier: GPL-3.0-only

//! Frame source replaying recorded images
//!
//! Lets the motion detector run against a folder of JPEG/PNG frames
//! instead of a live camera.

use super::FrameSource;
use super::types::CameraFrame;
use crate::constants::file_formats;
use crate::errors::CameraError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Replays the images of a directory in file-name order
pub struct DirectorySource {
    name: String,
    frames: Vec<PathBuf>,
    position: usize,
    looping: bool,
}

impl DirectorySource {
    /// Collect the supported images in `dir`
    pub fn open(dir: &Path) -> Result<Self, CameraError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            CameraError::Unavailable(format!("{}: {}", dir.display(), e))
        })?;

        let mut frames: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(file_formats::is_image_extension)
                    .unwrap_or(false)
            })
            .collect();

        if frames.is_empty() {
            return Err(CameraError::Unavailable(format!(
                "no images in {}",
                dir.display()
            )));
        }

        frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        info!(dir = %dir.display(), count = frames.len(), "Opened image directory");

        Ok(Self {
            name: dir.display().to_string(),
            frames,
            position: 0,
            looping: false,
        })
    }

    /// Restart from the first image instead of ending the stream
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Number of images in the directory
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self, _timeout: Duration) -> Result<CameraFrame, CameraError> {
        if self.position >= self.frames.len() {
            if !self.looping {
                return Err(CameraError::EndOfStream);
            }
            self.position = 0;
        }

        let path = &self.frames[self.position];
        self.position += 1;
        debug!(path = %path.display(), "Loading frame");

        let image = image::open(path)
            .map_err(|e| CameraError::BackendError(format!("{}: {}", path.display(), e)))?;
        Ok(CameraFrame::from_rgb_image(image.to_rgb8()))
    }

    fn request_resolution(&mut self, width: u32, height: u32) -> Result<(), CameraError> {
        debug!(width, height, "Recorded frames keep their size");
        Ok(())
    }
}
