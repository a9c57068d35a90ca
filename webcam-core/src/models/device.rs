use serde::{Deserialize, Serialize};

use super::error::WebcamError;

/// Kind of media device reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaDeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// A media device as enumerated by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub kind: MediaDeviceKind,
    /// Human-readable name. Hosts commonly leave this empty until capture
    /// permission has been granted.
    pub label: String,
    pub group_id: Option<String>,
}

impl MediaDeviceInfo {
    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind: MediaDeviceKind::VideoInput,
            label: label.into(),
            group_id: None,
        }
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == MediaDeviceKind::VideoInput
    }
}

/// Constraints passed to stream acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStreamConstraints {
    /// Specific device, or `None` to let the host pick.
    pub device_id: Option<String>,
    pub video: bool,
    pub audio: bool,
}

impl MediaStreamConstraints {
    /// Video track only, never audio.
    pub fn video_only(device_id: Option<&str>) -> Self {
        Self {
            device_id: device_id.map(str::to_owned),
            video: true,
            audio: false,
        }
    }
}

/// A decoded video frame in packed RGB8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, WebcamError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(WebcamError::EncodingFailed(format!(
                "frame buffer is {} bytes, expected {} for {}x{} rgb",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self { width, height, data })
    }

    /// A frame filled with a single colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
