//! # webcam-native
//!
//! Desktop backend for webcam-core.
//!
//! Provides:
//! - `FfmpegRecorderBackend`: time-sliced MP4/WebM recording through an `ffmpeg` child process
//! - `NokhwaDevices`: camera enumeration and capture via nokhwa (feature `camera`)
//! - `permissions`: camera access check and backend error classification
//!
//! ## Platform Requirements
//! - `ffmpeg` on `PATH` (or passed to `FfmpegRecorderBackend::with_binary`) built with libx264 and libvpx
//! - The `camera` feature links the platform camera stack (V4L2, AVFoundation or Media Foundation)
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use webcam_core::{enumerate_cameras, DirectorySaver, DisplaySurface, HeadlessPreview, ImageCanvas};
//! use webcam_native::{FfmpegRecorderBackend, NokhwaDevices};
//!
//! let devices: Arc<dyn webcam_core::MediaDevices> = Arc::new(NokhwaDevices::new());
//! let cameras = enumerate_cameras(&devices)?;
//! let mut display = DisplaySurface::new(
//!     HeadlessPreview::new(640),
//!     ImageCanvas::default(),
//!     Arc::new(FfmpegRecorderBackend::new()),
//!     Arc::new(DirectorySaver::new("captures")),
//!     Default::default(),
//! )?;
//! display.connect_camera(cameras[0].clone())?;
//! display.start_recording()?;
//! ```

pub mod ffmpeg_recorder;
#[cfg(feature = "camera")]
pub mod nokhwa_devices;
pub mod permissions;

pub use ffmpeg_recorder::{Container, FfmpegRecorder, FfmpegRecorderBackend};
#[cfg(feature = "camera")]
pub use nokhwa_devices::{NokhwaDevices, NokhwaStream};
pub use permissions::{check_camera_permission, classify_open_error};
