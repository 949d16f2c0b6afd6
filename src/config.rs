// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Settings are read from `<config dir>/data-collection/config.json`.
//! Command-line flags take precedence over the file, and the file takes
//! precedence over the built-in defaults in [`crate::constants`].

use crate::constants::{dataset, encoding, motion};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Name of the per-user configuration directory
pub const CONFIG_DIR_NAME: &str = "data-collection";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Motion detector settings
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Changed-pixel count a frame must exceed to be saved
    pub threshold: u64,
    /// Grayscale difference a pixel must exceed to count as changed
    pub pixel_threshold: u8,
    /// Sleep between frames in milliseconds
    pub interval_ms: u64,
    /// Folder snapshots are written to
    pub output_dir: PathBuf,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            threshold: motion::DEFAULT_THRESHOLD,
            pixel_threshold: motion::DEFAULT_PIXEL_THRESHOLD,
            interval_ms: motion::DEFAULT_INTERVAL_MS,
            output_dir: PathBuf::from(motion::DEFAULT_OUTPUT_DIR),
        }
    }
}

impl MotionSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera index (position in `data-collection list`)
    pub camera_index: usize,
    /// Folder the numbered dataset folders are created in
    pub dataset_root: PathBuf,
    /// JPEG quality for every written image
    pub jpeg_quality: u8,
    /// Motion detection settings
    pub motion: MotionSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            dataset_root: PathBuf::from(dataset::DEFAULT_ROOT),
            jpeg_quality: encoding::DEFAULT_JPEG_QUALITY,
            motion: MotionSettings::default(),
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the configuration from the default location
    ///
    /// A missing file (or no config directory at all) yields the defaults.
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load the configuration from a specific file
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the tools cannot work with
    pub fn validate(&self) -> AppResult<()> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(AppError::Config(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Apply `collect` command-line overrides
    pub fn merge_collect(&mut self, camera: Option<usize>, output: Option<PathBuf>) {
        if let Some(camera) = camera {
            self.camera_index = camera;
        }
        if let Some(output) = output {
            self.dataset_root = output;
        }
    }

    /// Apply `detect` command-line overrides
    pub fn merge_detect(&mut self, overrides: DetectOverrides) {
        if let Some(camera) = overrides.camera {
            self.camera_index = camera;
        }
        if let Some(output) = overrides.output {
            self.motion.output_dir = output;
        }
        if let Some(threshold) = overrides.threshold {
            self.motion.threshold = threshold;
        }
        if let Some(pixel_threshold) = overrides.pixel_threshold {
            self.motion.pixel_threshold = pixel_threshold;
        }
        if let Some(interval_ms) = overrides.interval_ms {
            self.motion.interval_ms = interval_ms;
        }
    }
}

/// Optional `detect` flags; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct DetectOverrides {
    pub camera: Option<usize>,
    pub output: Option<PathBuf>,
    pub threshold: Option<u64>,
    pub pixel_threshold: Option<u8>,
    pub interval_ms: Option<u64>,
}
