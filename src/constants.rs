// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Dataset capture defaults and naming
pub mod dataset {
    /// Folder prefix for numbered datasets (`dataset_1`, `dataset_2`, ...)
    pub const FOLDER_PREFIX: &str = "dataset_";

    /// File prefix for numbered images inside a dataset (`image_1.jpg`, ...)
    pub const IMAGE_PREFIX: &str = "image_";

    /// Root folder datasets are created in
    pub const DEFAULT_ROOT: &str = ".";
}

/// Motion detection defaults
pub mod motion {
    /// Changed-pixel count above which a frame counts as motion
    pub const DEFAULT_THRESHOLD: u64 = 500;

    /// Grayscale difference above which a pixel counts as changed
    pub const DEFAULT_PIXEL_THRESHOLD: u8 = 30;

    /// Pause between frame comparisons
    pub const DEFAULT_INTERVAL_MS: u64 = 500;

    /// Folder for motion snapshots
    pub const DEFAULT_OUTPUT_DIR: &str = "captured_changes";

    /// File prefix for motion snapshots
    pub const FILE_PREFIX: &str = "motion_";

    /// chrono format string for snapshot timestamps
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
}

/// JPEG output
pub mod encoding {
    /// Default JPEG quality (0-100)
    pub const DEFAULT_JPEG_QUALITY: u8 = 95;

    /// File extension for written images
    pub const EXTENSION: &str = "jpg";
}

/// GStreamer pipeline settings
pub mod pipeline {
    /// Maximum buffers held by the appsink
    pub const MAX_BUFFERS: u32 = 2;

    /// Frame channel capacity between the appsink and the consumer
    pub const CHANNEL_CAPACITY: usize = 4;

    /// Get number of threads for videoconvert based on available CPU threads
    pub fn videoconvert_threads() -> u32 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(4)
    }
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Log frame stats every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Pipeline stop timeout
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// How long to wait for a single frame before treating the read as failed
    pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Preview refresh tick in the terminal UI
    pub const PREVIEW_TICK: Duration = Duration::from_millis(10);
}

/// Supported image extensions for directory frame sources
pub mod file_formats {
    /// Image extensions readable as frames
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

    /// Check whether an extension (any case) names a supported image
    pub fn is_image_extension(ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        IMAGE_EXTENSIONS.contains(&ext.as_str())
    }
}
