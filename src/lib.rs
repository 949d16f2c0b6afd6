// SPDX-License-Identifier: MPL-2.0

//! Data collection tools for camera datasets
//!
//! Two tools share one camera stack:
//!
//! - `collect`: capture center-cropped images into `dataset_N/image_M.jpg`
//! - `detect`: save frames whose grayscale difference from the previous
//!   frame exceeds a changed-pixel threshold
//!
//! # Architecture
//!
//! - [`backends`]: Camera enumeration and frame sources
//! - [`pipelines`]: Cropping, dataset sessions, motion detection, JPEG output
//! - [`terminal`]: Terminal front ends
//! - [`config`]: User configuration handling
//! - [`errors`]: Error types

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult};
