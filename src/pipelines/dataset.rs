// SPDX-License-Identifier: GPL-3.0-only

//! Numbered dataset capture sessions
//!
//! A session walks through `datasets` folders, filling each with
//! `images_per_dataset` center-cropped JPEGs:
//!
//! ```text
//! <root>/dataset_1/image_1.jpg ... image_N.jpg
//! <root>/dataset_2/image_1.jpg ...
//! ```

use super::crop::center_crop;
use super::encoding::JpegWriter;
use crate::backends::camera::CameraFrame;
use crate::constants::{dataset, encoding};
use crate::errors::{CaptureError, InputError};
use std::path::PathBuf;
use tracing::info;

/// Validated session parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub datasets: u32,
    pub images_per_dataset: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureSettings {
    /// Parse the four form fields
    ///
    /// Every field must be an integer before any sign check happens, so
    /// `"abc"` next to `"0"` reports [`InputError::NotInteger`].
    pub fn parse(
        datasets: &str,
        images_per_dataset: &str,
        width: &str,
        height: &str,
    ) -> Result<Self, InputError> {
        let values = [datasets, images_per_dataset, width, height]
            .map(|field| field.trim().parse::<i64>());

        let mut parsed = [0i64; 4];
        for (slot, value) in parsed.iter_mut().zip(values) {
            *slot = value.map_err(|_| InputError::NotInteger)?;
        }

        if parsed.iter().any(|&v| v <= 0) {
            return Err(InputError::NotPositive);
        }

        let [datasets, images_per_dataset, width, height] =
            parsed.map(|v| u32::try_from(v).map_err(|_| InputError::NotInteger));
        Ok(Self {
            datasets: datasets?,
            images_per_dataset: images_per_dataset?,
            width: width?,
            height: height?,
        })
    }

    /// Square size to request from the camera so the crop has pixels to work with
    pub fn capture_resolution(&self) -> (u32, u32) {
        let side = self.width.max(self.height);
        (side, side)
    }
}

/// What a capture did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Still filling the current dataset
    Continue,
    /// The dataset just filled up; the next capture opens a new one
    NextDataset,
    /// Every dataset is full
    Complete,
}

/// Result of [`DatasetSession::capture`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub path: PathBuf,
    pub state: SessionState,
}

/// Capture progress across datasets
#[derive(Debug, Clone)]
pub struct DatasetSession {
    settings: CaptureSettings,
    root: PathBuf,
    writer: JpegWriter,
    /// 1-based dataset currently being filled
    dataset_count: u32,
    /// Images already saved in the current dataset
    image_count: u32,
}

impl DatasetSession {
    pub fn new(settings: CaptureSettings, root: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            root: root.into(),
            writer: JpegWriter::default(),
            dataset_count: 1,
            image_count: 0,
        }
    }

    pub fn with_writer(mut self, writer: JpegWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn dataset_count(&self) -> u32 {
        self.dataset_count
    }

    pub fn image_count(&self) -> u32 {
        self.image_count
    }

    pub fn is_complete(&self) -> bool {
        self.dataset_count > self.settings.datasets
    }

    /// Folder for dataset `index` (1-based)
    pub fn dataset_dir(&self, index: u32) -> PathBuf {
        self.root
            .join(format!("{}{}", dataset::FOLDER_PREFIX, index))
    }

    /// File for image `image` (1-based) of dataset `index`
    pub fn image_path(&self, index: u32, image: u32) -> PathBuf {
        self.dataset_dir(index).join(format!(
            "{}{}.{}",
            dataset::IMAGE_PREFIX,
            image,
            encoding::EXTENSION
        ))
    }

    /// Progress line shown under the preview
    pub fn status_text(&self) -> String {
        if self.is_complete() {
            return "Capture complete!".to_string();
        }
        format!(
            "Dataset {} / {} - Image {} / {}",
            self.dataset_count,
            self.settings.datasets,
            self.image_count + 1,
            self.settings.images_per_dataset
        )
    }

    /// Crop `frame`, save it as the next image and advance the counters
    pub fn capture(&mut self, frame: &CameraFrame) -> Result<CaptureOutcome, CaptureError> {
        if self.is_complete() {
            return Err(CaptureError::SessionComplete);
        }

        let image = frame.to_rgb_image()?;
        let cropped = center_crop(&image, self.settings.width, self.settings.height);

        let path = self.image_path(self.dataset_count, self.image_count + 1);
        self.writer.write(&cropped, &path)?;
        self.image_count += 1;
        info!(
            path = %path.display(),
            dataset = self.dataset_count,
            image = self.image_count,
            "Captured image"
        );

        let mut state = SessionState::Continue;
        if self.image_count >= self.settings.images_per_dataset {
            self.dataset_count += 1;
            self.image_count = 0;
            state = if self.is_complete() {
                SessionState::Complete
            } else {
                SessionState::NextDataset
            };
        }

        Ok(CaptureOutcome { path, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_fields() {
        let settings = CaptureSettings::parse("2", " 3 ", "224", "160").unwrap();
        assert_eq!(
            settings,
            CaptureSettings {
                datasets: 2,
                images_per_dataset: 3,
                width: 224,
                height: 160
            }
        );
        assert_eq!(settings.capture_resolution(), (224, 224));
    }

    #[test]
    fn test_parse_rejects_non_integers() {
        assert_eq!(
            CaptureSettings::parse("two", "3", "224", "224"),
            Err(InputError::NotInteger)
        );
        assert_eq!(
            CaptureSettings::parse("2", "3", "22.4", "224"),
            Err(InputError::NotInteger)
        );
        assert_eq!(
            CaptureSettings::parse("", "3", "224", "224"),
            Err(InputError::NotInteger)
        );
        // Integer check wins over the sign check
        assert_eq!(
            CaptureSettings::parse("0", "x", "224", "224"),
            Err(InputError::NotInteger)
        );
    }

    #[test]
    fn test_parse_rejects_non_positive() {
        assert_eq!(
            CaptureSettings::parse("0", "3", "224", "224"),
            Err(InputError::NotPositive)
        );
        assert_eq!(
            CaptureSettings::parse("1", "3", "-5", "224"),
            Err(InputError::NotPositive)
        );
    }

    #[test]
    fn test_status_text_counts_from_one() {
        let settings = CaptureSettings::parse("3", "5", "10", "10").unwrap();
        let session = DatasetSession::new(settings, "out");
        assert_eq!(session.status_text(), "Dataset 1 / 3 - Image 1 / 5");
    }

    #[test]
    fn test_paths_follow_naming_scheme() {
        let settings = CaptureSettings::parse("1", "1", "1", "1").unwrap();
        let session = DatasetSession::new(settings, "root");
        assert_eq!(
            session.image_path(2, 7),
            PathBuf::from("root").join("dataset_2").join("image_7.jpg")
        );
    }
}
