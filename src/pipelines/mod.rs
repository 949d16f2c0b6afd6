// SPDX-License-Identifier: MPL-2.0

//! Frame processing pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────────┐
//! │ Camera Frame │ ──▶ │  Dataset Session  │ ──▶ │ dataset_N/image_M.jpg│
//! │    (RGB)     │     │  - center crop    │     │                      │
//! │              │     │  - counters       │     │                      │
//! └──────────────┘     └───────────────────┘     └──────────────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────────┐
//! │ Camera Frame │ ──▶ │  Motion Detector  │ ──▶ │ motion_<time>.jpg    │
//! │    (RGB)     │     │  - grayscale diff │     │                      │
//! │              │     │  - pixel count    │     │                      │
//! └──────────────┘     └───────────────────┘     └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`crop`]: Center cropping
//! - [`dataset`]: Numbered dataset capture sessions
//! - [`encoding`]: JPEG encoding and file writes
//! - [`motion`]: Frame differencing and the detection loop

pub mod crop;
pub mod dataset;
pub mod encoding;
pub mod motion;
