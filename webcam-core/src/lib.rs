//! # webcam-core
//!
//! Platform-agnostic webcam core library.
//!
//! Provides camera handles, a preview display with still capture, time-sliced
//! video recording and download delivery. Hosts (desktop backends, browsers,
//! tests) implement the capability traits and inject them at construction;
//! nothing in this crate holds global state.
//!
//! ## Architecture
//!
//! ```text
//! webcam-core (this crate)
//! ├── traits/    ← MediaDevices, MediaStream, RecorderBackend, PreviewSurface, RasterSurface, FileSaver, DisplayDelegate
//! ├── models/    ← WebcamError, RecordingState, WebcamConfiguration, OutputFormat, devices, results
//! ├── camera/    ← CameraHandle, enumeration, permission prompt
//! ├── display/   ← DisplaySurface, HeadlessPreview, ImageCanvas
//! ├── session/   ← RecordingSession
//! └── storage/   ← ObjectUrlRegistry, Downloader, DirectorySaver
//! ```
//!
//! ## Usage
//! ```ignore
//! let devices: Arc<dyn MediaDevices> = Arc::new(host_devices);
//! let cameras = enumerate_cameras(&devices)?;
//! let mut display = DisplaySurface::new(
//!     HeadlessPreview::new(640),
//!     ImageCanvas::default(),
//!     recorder_backend,
//!     Arc::new(DirectorySaver::new("captures")),
//!     WebcamConfiguration::default(),
//! )?;
//! display.connect_camera(cameras[0].clone())?;
//! display.download_still()?;
//! ```

pub mod camera;
pub mod display;
pub mod models;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience.
pub use camera::handle::{CameraHandle, SharedCamera};
pub use camera::{enumerate_cameras, request_permission};
pub use display::canvas::ImageCanvas;
pub use display::preview::HeadlessPreview;
pub use display::surface::DisplaySurface;
pub use models::capture_result::{RecordingSummary, StillImage};
pub use models::config::WebcamConfiguration;
pub use models::device::{MediaDeviceInfo, MediaDeviceKind, MediaStreamConstraints, VideoFrame};
pub use models::error::WebcamError;
pub use models::format::{OutputFormat, select_output_format};
pub use models::state::RecordingState;
pub use session::recording::RecordingSession;
pub use storage::directory_saver::DirectorySaver;
pub use storage::download::{DownloadReceipt, Downloader};
pub use storage::object_url::{Blob, ObjectUrl, ObjectUrlRegistry};
pub use traits::display_delegate::DisplayDelegate;
pub use traits::file_saver::{DownloadLink, FileSaver};
pub use traits::media_devices::{MediaDevices, MediaStream, StreamHandle};
pub use traits::media_recorder::{MediaRecorder, RecorderBackend, SegmentCallback};
pub use traits::surfaces::{PreviewSurface, RasterSurface};
