use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::device::{MediaDeviceInfo, MediaStreamConstraints};
use crate::models::error::WebcamError;
use crate::traits::media_devices::{MediaDevices, StreamHandle};

/// Camera shared between the device list and the display it is connected to.
pub type SharedCamera = Arc<Mutex<CameraHandle>>;

/// One selectable video input device.
///
/// Owns at most one live stream, present only between a successful
/// `start()` and the next `stop()`.
pub struct CameraHandle {
    device_id: String,
    label: String,
    devices: Arc<dyn MediaDevices>,
    stream: Option<StreamHandle>,
}

impl CameraHandle {
    pub fn new(info: &MediaDeviceInfo, devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            device_id: info.device_id.clone(),
            label: info.label.clone(),
            devices,
            stream: None,
        }
    }

    pub fn into_shared(self) -> SharedCamera {
        Arc::new(Mutex::new(self))
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label, or the device id when the host withheld the label.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.device_id
        } else {
            &self.label
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the device's video track (never audio) and keep the stream.
    ///
    /// A stream still held from an earlier start is stopped first.
    pub fn start(&mut self) -> Result<StreamHandle, WebcamError> {
        if self.stream.is_some() {
            log::warn!("Camera {} started twice, stopping previous stream", self.device_id);
            self.stop();
        }

        let constraints = MediaStreamConstraints::video_only(Some(&self.device_id));
        let stream = self.devices.get_user_media(&constraints).map_err(|e| {
            log::error!("Failed to start camera {}: {}", self.device_id, e);
            e
        })?;

        log::info!("Camera started: {} (stream {})", self.display_name(), stream.id());
        self.stream = Some(Arc::clone(&stream));
        Ok(stream)
    }

    /// Stop every track of the owned stream. Does nothing when idle.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop_tracks();
            log::info!("Camera stopped: {}", self.display_name());
        }
    }

    pub fn active_stream(&self) -> Result<StreamHandle, WebcamError> {
        self.stream.clone().ok_or(WebcamError::NotStarted)
    }
}

impl fmt::Debug for CameraHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraHandle")
            .field("device_id", &self.device_id)
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}
