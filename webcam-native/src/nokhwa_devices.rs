//! Camera enumeration and capture through nokhwa.
//!
//! Each opened stream owns a dedicated capture thread; the nokhwa `Camera`
//! is created, used and dropped on that thread only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex;

use webcam_core::{
    MediaDeviceInfo, MediaDevices, MediaStream, MediaStreamConstraints, StreamHandle, VideoFrame, WebcamError,
};

use crate::permissions::classify_open_error;

/// How long `open` waits for the first decoded frame.
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

type ReadySender = Sender<Result<(), WebcamError>>;

/// Host cameras as seen by nokhwa's native backend.
#[derive(Debug, Default, Clone)]
pub struct NokhwaDevices;

impl NokhwaDevices {
    pub fn new() -> Self {
        Self
    }
}

/// Device ids are nokhwa index strings; numeric ids map back to indices.
fn parse_index(device_id: &str) -> CameraIndex {
    match device_id.parse::<u32>() {
        Ok(n) => CameraIndex::Index(n),
        Err(_) => CameraIndex::String(device_id.to_string()),
    }
}

impl MediaDevices for NokhwaDevices {
    fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, WebcamError> {
        let cameras = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| WebcamError::DeviceUnavailable(format!("camera query failed: {}", e)))?;

        Ok(cameras
            .iter()
            .map(|info| MediaDeviceInfo::video_input(info.index().as_string(), info.human_name()))
            .collect())
    }

    fn get_user_media(&self, constraints: &MediaStreamConstraints) -> Result<StreamHandle, WebcamError> {
        if !constraints.video {
            return Err(WebcamError::ConfigurationFailed("a video track is required".into()));
        }
        if constraints.audio {
            return Err(WebcamError::ConfigurationFailed("audio capture is not supported".into()));
        }

        let index = constraints
            .device_id
            .as_deref()
            .map(parse_index)
            .unwrap_or(CameraIndex::Index(0));

        NokhwaStream::open(index).map(|stream| stream as StreamHandle)
    }
}

/// Live nokhwa capture keeping the latest decoded frame.
pub struct NokhwaStream {
    id: String,
    running: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl NokhwaStream {
    /// Open `index` and wait until the first frame has been decoded, so a
    /// returned stream always has a `current_frame`.
    pub fn open(index: CameraIndex) -> Result<Arc<Self>, WebcamError> {
        let running = Arc::new(AtomicBool::new(true));
        let latest = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), WebcamError>>(1);
        let label = index.as_string();

        let handle = thread::Builder::new()
            .name("nokhwa-capture".into())
            .spawn({
                let running = Arc::clone(&running);
                let latest = Arc::clone(&latest);
                move || capture_loop(index, running, latest, ready_tx)
            })
            .map_err(|e| WebcamError::DeviceUnavailable(format!("failed to spawn capture thread: {}", e)))?;

        match ready_rx.recv_timeout(FIRST_FRAME_TIMEOUT) {
            Ok(Ok(())) => Ok(Arc::new(Self {
                id: format!("{}-{}", label, uuid::Uuid::new_v4()),
                running,
                latest,
                capture_handle: Mutex::new(Some(handle)),
            })),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) => {
                running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(WebcamError::DeviceUnavailable(format!(
                    "camera {} produced no frame within {:?}",
                    label, FIRST_FRAME_TIMEOUT
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                Err(WebcamError::DeviceUnavailable("capture thread exited before the first frame".into()))
            }
        }
    }
}

impl MediaStream for NokhwaStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.is_active() {
            return None;
        }
        self.latest.lock().clone()
    }

    fn stop_tracks(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            let _ = handle.join();
        }
        *self.latest.lock() = None;
    }
}

impl Drop for NokhwaStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// Store `frame` as the latest one. The first call reports the stream ready.
fn publish_frame(latest: &Mutex<Option<VideoFrame>>, frame: VideoFrame, ready: &mut Option<ReadySender>) {
    *latest.lock() = Some(frame);
    if let Some(tx) = ready.take() {
        let _ = tx.send(Ok(()));
    }
}

/// Capture loop running on a dedicated thread.
///
/// Sequence:
/// 1. Create the camera with the highest frame rate format
/// 2. Open the stream
/// 3. Decode frames to RGB until stopped, reporting readiness on the first
/// 4. Stop the stream
fn capture_loop(
    index: CameraIndex,
    running: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<VideoFrame>>>,
    ready_tx: ReadySender,
) {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera = match Camera::new(index, requested) {
        Ok(c) => c,
        Err(e) => {
            running.store(false, Ordering::SeqCst);
            let _ = ready_tx.send(Err(classify_open_error(&e.to_string())));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        running.store(false, Ordering::SeqCst);
        let _ = ready_tx.send(Err(classify_open_error(&e.to_string())));
        return;
    }

    log::info!("Camera stream opened: {}", camera.info().human_name());
    let mut ready = Some(ready_tx);

    while running.load(Ordering::SeqCst) {
        let buffer = match camera.frame() {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Frame read failed: {}", e);
                thread::sleep(Duration::from_millis(10));
                continue;
            }
        };

        match buffer.decode_image::<RgbFormat>() {
            Ok(decoded) => {
                let (width, height) = decoded.dimensions();
                match VideoFrame::new(width, height, decoded.into_raw()) {
                    Ok(frame) => publish_frame(&latest, frame, &mut ready),
                    Err(e) => log::warn!("Dropping malformed frame: {}", e),
                }
            }
            Err(e) => log::warn!("Frame decode failed: {}", e),
        }
    }

    if let Err(e) = camera.stop_stream() {
        log::warn!("Failed to stop camera stream: {}", e);
    }
}
