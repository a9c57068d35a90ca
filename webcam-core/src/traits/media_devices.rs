use std::sync::Arc;

use crate::models::device::{MediaDeviceInfo, MediaStreamConstraints, VideoFrame};
use crate::models::error::WebcamError;

/// A live stream bound to a capture device's video track.
///
/// Implementations are shared between the camera that opened them, the
/// preview they are bound to and any recorder reading from them.
pub trait MediaStream: Send + Sync {
    /// Host identifier of the stream.
    fn id(&self) -> &str;

    /// Whether any track is still live.
    fn is_active(&self) -> bool;

    /// Most recent decoded frame, if one has arrived and the stream is live.
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Stop every track and release the device. Must be idempotent.
    fn stop_tracks(&self);
}

pub type StreamHandle = Arc<dyn MediaStream>;

/// Host device enumeration and stream acquisition.
///
/// Implemented by:
/// - `NokhwaDevices` (webcam-native, `camera` feature)
/// - test fakes
pub trait MediaDevices: Send + Sync {
    /// All media devices in host order.
    fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, WebcamError>;

    /// Open a stream. Fails with `PermissionDenied` when the user refuses
    /// access and `DeviceUnavailable` when the device cannot be opened.
    fn get_user_media(&self, constraints: &MediaStreamConstraints) -> Result<StreamHandle, WebcamError>;
}
