//! In-memory host used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::device::{MediaDeviceInfo, MediaDeviceKind, MediaStreamConstraints, VideoFrame};
use crate::models::error::WebcamError;
use crate::models::state::RecordingState;
use crate::storage::download::DownloadReceipt;
use crate::storage::object_url::ObjectUrlRegistry;
use crate::traits::display_delegate::DisplayDelegate;
use crate::traits::file_saver::{DownloadLink, FileSaver};
use crate::traits::media_devices::{MediaDevices, MediaStream, StreamHandle};
use crate::traits::media_recorder::{MediaRecorder, RecorderBackend, SegmentCallback};

pub struct FakeStream {
    id: String,
    device_id: Option<String>,
    active: AtomicBool,
    stop_calls: AtomicUsize,
    frame: Mutex<Option<VideoFrame>>,
}

impl FakeStream {
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn set_frame(&self, frame: Option<VideoFrame>) {
        *self.frame.lock() = frame;
    }
}

impl MediaStream for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.is_active() {
            return None;
        }
        self.frame.lock().clone()
    }

    fn stop_tracks(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }
}

pub struct FakeDevices {
    devices: Vec<MediaDeviceInfo>,
    failures: Mutex<HashMap<String, WebcamError>>,
    opened: Mutex<Vec<Arc<FakeStream>>>,
    frame: VideoFrame,
}

impl FakeDevices {
    /// Video inputs `(device_id, label)` plus one microphone that
    /// enumeration must filter out.
    pub fn with_cameras(cameras: &[(&str, &str)]) -> Arc<Self> {
        let mut devices = vec![MediaDeviceInfo {
            device_id: "mic-1".into(),
            kind: MediaDeviceKind::AudioInput,
            label: "Microphone".into(),
            group_id: None,
        }];
        devices.extend(cameras.iter().map(|(id, label)| MediaDeviceInfo::video_input(*id, *label)));
        Arc::new(Self {
            devices,
            failures: Mutex::new(HashMap::new()),
            opened: Mutex::new(Vec::new()),
            frame: VideoFrame::solid(320, 240, [200, 40, 40]),
        })
    }

    pub fn fail_with(&self, device_id: &str, error: WebcamError) {
        self.failures.lock().insert(device_id.to_string(), error);
    }

    pub fn streams_for(&self, device_id: &str) -> Vec<Arc<FakeStream>> {
        self.opened
            .lock()
            .iter()
            .filter(|s| s.device_id() == Some(device_id))
            .cloned()
            .collect()
    }

    pub fn opened(&self) -> Vec<Arc<FakeStream>> {
        self.opened.lock().clone()
    }
}

impl MediaDevices for FakeDevices {
    fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, WebcamError> {
        Ok(self.devices.clone())
    }

    fn get_user_media(&self, constraints: &MediaStreamConstraints) -> Result<StreamHandle, WebcamError> {
        assert!(constraints.video && !constraints.audio, "only video is ever requested");
        let key = constraints.device_id.clone().unwrap_or_default();
        if let Some(err) = self.failures.lock().get(&key) {
            return Err(err.clone());
        }
        let stream = Arc::new(FakeStream {
            id: format!("stream-{}", self.opened.lock().len() + 1),
            device_id: constraints.device_id.clone(),
            active: AtomicBool::new(true),
            stop_calls: AtomicUsize::new(0),
            frame: Mutex::new(Some(self.frame.clone())),
        });
        self.opened.lock().push(Arc::clone(&stream));
        Ok(stream)
    }
}

/// Shared view of a fake sink so tests can push segments.
pub struct FakeRecorderControl {
    on_data: SegmentCallback,
    pub stream_id: String,
    timeslice: Mutex<Option<Duration>>,
    trailing: Mutex<Option<Vec<u8>>>,
    stop_failure: Mutex<Option<WebcamError>>,
    stopped: AtomicBool,
}

impl FakeRecorderControl {
    pub fn deliver(&self, segment: &[u8]) {
        (self.on_data)(segment.to_vec());
    }

    /// Segment flushed by `stop()`.
    pub fn set_trailing(&self, segment: &[u8]) {
        *self.trailing.lock() = Some(segment.to_vec());
    }

    /// Make the next `stop()` fail with `err`.
    pub fn fail_stop(&self, err: WebcamError) {
        *self.stop_failure.lock() = Some(err);
    }

    pub fn timeslice(&self) -> Option<Duration> {
        *self.timeslice.lock()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

struct FakeRecorder {
    mime_type: String,
    control: Arc<FakeRecorderControl>,
}

impl MediaRecorder for FakeRecorder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn start(&mut self, timeslice: Duration) -> Result<(), WebcamError> {
        *self.control.timeslice.lock() = Some(timeslice);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), WebcamError> {
        if let Some(err) = self.control.stop_failure.lock().take() {
            return Err(err);
        }
        if let Some(segment) = self.control.trailing.lock().take() {
            (self.control.on_data)(segment);
        }
        self.control.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeRecorderBackend {
    supported: Vec<String>,
    negotiated: Option<String>,
    recorders: Mutex<Vec<Arc<FakeRecorderControl>>>,
}

impl FakeRecorderBackend {
    pub fn supporting(types: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            supported: types.iter().map(|t| t.to_string()).collect(),
            negotiated: None,
            recorders: Mutex::new(Vec::new()),
        })
    }

    /// Sinks report `negotiated` as their type whatever was requested.
    pub fn negotiating(types: &[&str], negotiated: &str) -> Arc<Self> {
        Arc::new(Self {
            supported: types.iter().map(|t| t.to_string()).collect(),
            negotiated: Some(negotiated.to_string()),
            recorders: Mutex::new(Vec::new()),
        })
    }

    pub fn created(&self) -> usize {
        self.recorders.lock().len()
    }

    pub fn last(&self) -> Arc<FakeRecorderControl> {
        Arc::clone(self.recorders.lock().last().expect("no recorder created"))
    }
}

impl RecorderBackend for FakeRecorderBackend {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.supported.iter().any(|t| t == mime_type)
    }

    fn create_recorder(
        &self,
        stream: StreamHandle,
        mime_type: &str,
        on_data: SegmentCallback,
    ) -> Result<Box<dyn MediaRecorder>, WebcamError> {
        let control = Arc::new(FakeRecorderControl {
            on_data,
            stream_id: stream.id().to_string(),
            timeslice: Mutex::new(None),
            trailing: Mutex::new(None),
            stop_failure: Mutex::new(None),
            stopped: AtomicBool::new(false),
        });
        self.recorders.lock().push(Arc::clone(&control));
        Ok(Box::new(FakeRecorder {
            mime_type: self.negotiated.clone().unwrap_or_else(|| mime_type.to_string()),
            control,
        }))
    }
}

/// Saver that keeps `(file_name, payload)` pairs.
pub struct RecordingSaver {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
    failure: Option<String>,
}

impl RecordingSaver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            saved: Mutex::new(Vec::new()),
            failure: None,
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            saved: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        })
    }

    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().clone()
    }
}

impl FileSaver for RecordingSaver {
    fn save(&self, link: &DownloadLink, registry: &Arc<ObjectUrlRegistry>) -> Result<(), WebcamError> {
        if let Some(message) = &self.failure {
            return Err(WebcamError::StorageError(message.clone()));
        }
        let blob = registry.resolve(&link.url).expect("url must be live while saving");
        self.saved.lock().push((link.file_name.clone(), blob.data().to_vec()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDelegate {
    events: Mutex<Vec<String>>,
}

impl RecordingDelegate {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl DisplayDelegate for RecordingDelegate {
    fn on_camera_connected(&self, device_id: &str) {
        self.events.lock().push(format!("connected:{}", device_id));
    }

    fn on_camera_disconnected(&self, device_id: &str) {
        self.events.lock().push(format!("disconnected:{}", device_id));
    }

    fn on_recording_state_changed(&self, state: RecordingState) {
        self.events.lock().push(format!("recording:{:?}", state));
    }

    fn on_download_started(&self, receipt: &DownloadReceipt) {
        self.events.lock().push(format!("download:{}", receipt.file_name));
    }
}
