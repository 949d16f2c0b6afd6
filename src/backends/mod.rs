// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for frame capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        collect / detect / list              │
//! └────────────────────┬────────────────────────┘
//!                      │  FrameSource
//! ┌────────────────────┴────────────────────────┐
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │  CameraPipeline  │  │ DirectorySource │  │
//! │  │ (GStreamer/V4L2) │  │ (recorded files)│  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Camera enumeration and frame sources

pub mod camera;
