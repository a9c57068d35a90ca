use std::sync::Arc;

use crate::camera::handle::SharedCamera;
use crate::display::canvas::ImageCanvas;
use crate::display::preview::HeadlessPreview;
use crate::models::capture_result::{RecordingSummary, StillImage};
use crate::models::config::WebcamConfiguration;
use crate::models::error::WebcamError;
use crate::models::state::RecordingState;
use crate::session::recording::RecordingSession;
use crate::storage::download::{DownloadReceipt, Downloader};
use crate::storage::object_url::Blob;
use crate::traits::display_delegate::DisplayDelegate;
use crate::traits::file_saver::FileSaver;
use crate::traits::media_devices::StreamHandle;
use crate::traits::media_recorder::RecorderBackend;
use crate::traits::surfaces::{PreviewSurface, RasterSurface};

const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Shows the connected camera and turns it into stills and recordings.
///
/// Holds at most one connected camera and at most one recording session;
/// a session only exists while a camera is connected.
pub struct DisplaySurface<P: PreviewSurface = HeadlessPreview, R: RasterSurface = ImageCanvas> {
    preview: P,
    raster: R,
    recorder_backend: Arc<dyn RecorderBackend>,
    downloader: Downloader,
    config: WebcamConfiguration,
    camera: Option<SharedCamera>,
    session: Option<RecordingSession>,
    delegate: Option<Arc<dyn DisplayDelegate>>,
}

impl<P: PreviewSurface, R: RasterSurface> DisplaySurface<P, R> {
    pub fn new(
        preview: P,
        raster: R,
        recorder_backend: Arc<dyn RecorderBackend>,
        saver: Arc<dyn FileSaver>,
        config: WebcamConfiguration,
    ) -> Result<Self, WebcamError> {
        config.validate().map_err(WebcamError::ConfigurationFailed)?;
        let downloader = Downloader::new(saver, config.url_release_delay);
        Ok(Self {
            preview,
            raster,
            recorder_backend,
            downloader,
            config,
            camera: None,
            session: None,
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn DisplayDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn preview(&self) -> &P {
        &self.preview
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    pub fn connected_camera(&self) -> Option<&SharedCamera> {
        self.camera.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.session.as_ref().is_some_and(RecordingSession::is_recording)
    }

    pub fn recording_state(&self) -> Option<RecordingState> {
        self.session.as_ref().map(RecordingSession::state)
    }

    /// Swap the preview over to `camera`.
    ///
    /// The current camera is disconnected first. If the new camera fails to
    /// start the display is left with no camera.
    pub fn connect_camera(&mut self, camera: SharedCamera) -> Result<StreamHandle, WebcamError> {
        if self.session.is_some() {
            log::warn!("Refusing to switch cameras while recording");
            return Err(WebcamError::AlreadyRecording);
        }

        if self.camera.is_some() {
            self.disconnect_camera();
        }

        let (stream, device_id) = {
            let mut cam = camera.lock();
            let stream = cam.start()?;
            (stream, cam.device_id().to_string())
        };

        self.preview.set_source(Some(Arc::clone(&stream)));
        if let Err(e) = self.preview.play() {
            log::error!("Preview playback failed for {}: {}", device_id, e);
            self.preview.set_source(None);
            camera.lock().stop();
            return Err(e);
        }

        self.camera = Some(camera);
        log::info!("Display connected to {}", device_id);
        if let Some(ref delegate) = self.delegate {
            delegate.on_camera_connected(&device_id);
        }
        Ok(stream)
    }

    /// Stop the connected camera (if any) and clear the preview.
    pub fn disconnect_camera(&mut self) {
        if let Some(mut session) = self.session.take() {
            log::warn!("Camera disconnected during recording {}, discarding it", session.id());
            session.abort();
            self.notify_recording(RecordingState::Stopped);
        }

        if let Some(camera) = self.camera.take() {
            let device_id = {
                let mut cam = camera.lock();
                cam.stop();
                cam.device_id().to_string()
            };
            log::info!("Display disconnected from {}", device_id);
            if let Some(ref delegate) = self.delegate {
                delegate.on_camera_disconnected(&device_id);
            }
        }

        self.preview.set_source(None);
    }

    /// Snapshot the preview as JPEG at its displayed size.
    ///
    /// A preview with no visible area yields an empty image.
    pub fn capture_still(&mut self) -> Result<StillImage, WebcamError> {
        if self.camera.is_none() {
            return Err(WebcamError::NoActiveCamera);
        }

        let (width, height) = self.preview.client_size();
        self.raster.resize(width, height);
        if width == 0 || height == 0 {
            log::warn!("Preview is {}x{}, nothing to capture", width, height);
            return Ok(StillImage::empty(width, height));
        }

        match self.preview.current_frame() {
            Some(frame) => self.raster.draw_frame(&frame, width, height)?,
            None => log::debug!("No frame decoded yet, capturing blank canvas"),
        }

        let jpeg = self.raster.encode_jpeg(self.config.jpeg_quality)?;
        log::debug!("Captured {}x{} still ({} bytes)", width, height, jpeg.len());
        Ok(StillImage { width, height, jpeg })
    }

    /// Capture a still and save it under the configured still file name.
    ///
    /// Returns `None` when the capture was empty and nothing was saved.
    pub fn download_still(&mut self) -> Result<Option<DownloadReceipt>, WebcamError> {
        let still = self.capture_still()?;
        if still.is_empty() {
            return Ok(None);
        }

        let receipt = self
            .downloader
            .download(Blob::new(still.jpeg, JPEG_MIME_TYPE), &self.config.still_file_name)?;
        if let Some(ref delegate) = self.delegate {
            delegate.on_download_started(&receipt);
        }
        Ok(Some(receipt))
    }

    pub fn start_recording(&mut self) -> Result<(), WebcamError> {
        let camera = self.camera.as_ref().ok_or(WebcamError::NoActiveCamera)?;
        if self.session.is_some() {
            return Err(WebcamError::AlreadyRecording);
        }

        let stream = camera.lock().active_stream()?;
        let mut session = RecordingSession::with_config(stream, &*self.recorder_backend, &self.config)?;
        session.start()?;

        self.session = Some(session);
        self.notify_recording(RecordingState::Recording);
        Ok(())
    }

    /// Stop the active recording and save it.
    ///
    /// The session is released even when saving fails.
    pub fn stop_recording(&mut self) -> Result<(DownloadReceipt, RecordingSummary), WebcamError> {
        let mut session = self.session.take().ok_or(WebcamError::NoActiveRecording)?;

        let stopped = session.stop();
        self.notify_recording(RecordingState::Stopped);
        stopped?;

        let (receipt, summary) =
            session.finalize_and_download(&self.downloader, &self.config.recording_file_stem)?;
        log::info!(
            "Recording {} saved as {} ({} bytes, {:.1}s)",
            summary.id,
            summary.file_name,
            summary.byte_len,
            summary.duration_secs
        );
        if let Some(ref delegate) = self.delegate {
            delegate.on_download_started(&receipt);
        }
        Ok((receipt, summary))
    }

    fn notify_recording(&self, state: RecordingState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_recording_state_changed(state);
        }
    }
}
