use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::models::capture_result::RecordingSummary;
use crate::models::config::WebcamConfiguration;
use crate::models::error::WebcamError;
use crate::models::format::{select_output_format, OutputFormat};
use crate::models::state::RecordingState;
use crate::storage::download::{DownloadReceipt, Downloader};
use crate::storage::object_url::Blob;
use crate::traits::media_devices::StreamHandle;
use crate::traits::media_recorder::{MediaRecorder, RecorderBackend, SegmentCallback};

/// Segments collected from the sink, shared with its data callback.
#[derive(Default)]
struct SegmentBuffer {
    chunks: Vec<Vec<u8>>,
    sealed: bool,
}

/// Records one live stream into a single downloadable file.
///
/// ```text
/// [MediaStream] → [MediaRecorder] --segment every timeslice--> [SegmentBuffer]
///                                                                   ↓ finalize
///                                                    [Blob] → [Downloader]
/// ```
///
/// The buffer is only appended to by the sink callback, in delivery order,
/// and the final payload is the concatenation in that order.
pub struct RecordingSession {
    id: String,
    format: OutputFormat,
    timeslice: Duration,
    recorder: Box<dyn MediaRecorder>,
    buffer: Arc<Mutex<SegmentBuffer>>,
    state: RecordingState,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
}

impl RecordingSession {
    /// Negotiate a container from `preference` and create the sink.
    pub fn new(
        stream: StreamHandle,
        backend: &dyn RecorderBackend,
        preference: &[OutputFormat],
        timeslice: Duration,
    ) -> Result<Self, WebcamError> {
        let format = select_output_format(backend, preference).map_err(|e| {
            log::error!("No usable recording container among {:?}", preference);
            e
        })?;

        let buffer = Arc::new(Mutex::new(SegmentBuffer::default()));
        let on_data: SegmentCallback = {
            let buffer = Arc::clone(&buffer);
            Arc::new(move |segment: Vec<u8>| {
                if segment.is_empty() {
                    return;
                }
                let mut b = buffer.lock();
                if b.sealed {
                    log::debug!("Dropping {} byte segment after finalize", segment.len());
                    return;
                }
                b.chunks.push(segment);
            })
        };

        let recorder = backend.create_recorder(stream, &format.mime_type, on_data)?;
        let id = uuid::Uuid::new_v4().to_string();
        log::debug!("Recording session {} using {}", id, format.mime_type);

        Ok(Self {
            id,
            format,
            timeslice,
            recorder,
            buffer,
            state: RecordingState::Idle,
            started_at: None,
            stopped_at: None,
        })
    }

    pub fn with_config(
        stream: StreamHandle,
        backend: &dyn RecorderBackend,
        config: &WebcamConfiguration,
    ) -> Result<Self, WebcamError> {
        Self::new(stream, backend, &config.format_preference, config.timeslice)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn format(&self) -> &OutputFormat {
        &self.format
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    pub fn chunk_count(&self) -> usize {
        self.buffer.lock().chunks.len()
    }

    /// Transitions: idle → recording.
    pub fn start(&mut self) -> Result<(), WebcamError> {
        match self.state {
            RecordingState::Idle => {}
            RecordingState::Recording => return Err(WebcamError::AlreadyRecording),
            RecordingState::Stopped => {
                return Err(WebcamError::ConfigurationFailed("session already stopped".into()))
            }
        }

        self.recorder.start(self.timeslice)?;
        self.started_at = Some(Utc::now());
        self.state = RecordingState::Recording;
        log::info!("Recording started ({}, {:?} slices)", self.format.mime_type, self.timeslice);
        Ok(())
    }

    /// Transitions: recording → stopped.
    ///
    /// Returns once the sink has flushed its trailing segment.
    pub fn stop(&mut self) -> Result<(), WebcamError> {
        if !self.state.is_recording() {
            return Err(WebcamError::NotRecording);
        }

        self.state = RecordingState::Stopped;
        self.stopped_at = Some(Utc::now());
        self.recorder.stop()?;
        log::info!("Recording stopped with {} segment(s)", self.chunk_count());
        Ok(())
    }

    /// Concatenate the collected segments into one payload.
    pub fn finalize(&mut self, file_stem: &str) -> Result<(Blob, RecordingSummary), WebcamError> {
        if self.state.is_recording() {
            return Err(WebcamError::ConfigurationFailed(
                "stop the recording before finalizing".into(),
            ));
        }

        let chunks = {
            let mut b = self.buffer.lock();
            if b.chunks.is_empty() {
                return Err(WebcamError::EmptyRecording);
            }
            b.sealed = true;
            std::mem::take(&mut b.chunks)
        };

        // tagged with what the sink actually produced, which may carry codec parameters
        let mime_type = self.recorder.mime_type().to_string();
        let blob = Blob::from_chunks(&chunks, mime_type.clone());
        let now = Utc::now();
        let summary = RecordingSummary::new(
            &self.id,
            &mime_type,
            &self.format.file_name(file_stem),
            chunks.len(),
            blob.data(),
            self.started_at.unwrap_or(now),
            self.stopped_at.unwrap_or(now),
        );
        Ok((blob, summary))
    }

    /// Finalize and hand the payload to `downloader` as `file_stem` plus the
    /// format's extension.
    pub fn finalize_and_download(
        &mut self,
        downloader: &Downloader,
        file_stem: &str,
    ) -> Result<(DownloadReceipt, RecordingSummary), WebcamError> {
        let (blob, summary) = self.finalize(file_stem)?;
        let receipt = downloader.download(blob, &summary.file_name)?;
        Ok((receipt, summary))
    }

    /// Stop without producing a file. Collected segments are discarded.
    pub fn abort(&mut self) {
        if self.state.is_recording() {
            self.state = RecordingState::Stopped;
            self.stopped_at = Some(Utc::now());
            if let Err(e) = self.recorder.stop() {
                log::warn!("Recorder failed to stop during abort: {}", e);
            }
        }
        let mut b = self.buffer.lock();
        b.sealed = true;
        b.chunks.clear();
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.state.is_recording() {
            log::warn!("Recording session {} dropped while recording", self.id);
            self.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeDevices, FakeRecorderBackend, RecordingSaver};
    use crate::models::device::MediaStreamConstraints;
    use crate::models::format::default_preference;
    use crate::traits::media_devices::MediaDevices;

    fn session(backend: &FakeRecorderBackend) -> RecordingSession {
        let devices = FakeDevices::with_cameras(&[("cam-1", "Front")]);
        let stream = devices
            .get_user_media(&MediaStreamConstraints::video_only(Some("cam-1")))
            .unwrap();
        RecordingSession::new(stream, backend, &default_preference(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn unsupported_host_fails_construction() {
        let backend = FakeRecorderBackend::supporting(&[]);
        let devices = FakeDevices::with_cameras(&[("cam-1", "Front")]);
        let stream = devices
            .get_user_media(&MediaStreamConstraints::video_only(Some("cam-1")))
            .unwrap();

        let result = RecordingSession::new(stream, &*backend, &default_preference(), Duration::from_secs(1));
        assert_eq!(result.err(), Some(WebcamError::UnsupportedFormat));
        assert_eq!(backend.created(), 0);
    }

    #[test]
    fn start_uses_one_second_slices() {
        let backend = FakeRecorderBackend::supporting(&["video/webm"]);
        let mut s = session(&backend);
        s.start().unwrap();

        assert_eq!(backend.last().timeslice(), Some(Duration::from_millis(1000)));
        assert_eq!(s.state(), RecordingState::Recording);
        assert_eq!(s.format().extension, ".webm");
    }

    #[test]
    fn start_twice_fails() {
        let backend = FakeRecorderBackend::supporting(&["video/mp4"]);
        let mut s = session(&backend);
        s.start().unwrap();
        assert_eq!(s.start(), Err(WebcamError::AlreadyRecording));
    }

    #[test]
    fn stop_without_start_fails() {
        let backend = FakeRecorderBackend::supporting(&["video/mp4"]);
        let mut s = session(&backend);
        assert_eq!(s.stop(), Err(WebcamError::NotRecording));
    }

    #[test]
    fn stopped_is_terminal() {
        let backend = FakeRecorderBackend::supporting(&["video/mp4"]);
        let mut s = session(&backend);
        s.start().unwrap();
        s.stop().unwrap();

        assert!(s.state().is_terminal());
        assert!(matches!(s.start(), Err(WebcamError::ConfigurationFailed(_))));
        assert_eq!(s.stop(), Err(WebcamError::NotRecording));
    }

    #[test]
    fn stop_waits_for_trailing_segment() {
        let backend = FakeRecorderBackend::supporting(&["video/webm"]);
        let mut s = session(&backend);
        s.start().unwrap();

        let sink = backend.last();
        sink.deliver(b"one");
        sink.set_trailing(b"tail");
        s.stop().unwrap();

        assert!(sink.is_stopped());
        assert_eq!(s.chunk_count(), 2);
        let (blob, summary) = s.finalize("capture").unwrap();
        assert_eq!(blob.data(), b"onetail");
        assert_eq!(summary.chunk_count, 2);
    }

    #[test]
    fn payload_is_segments_in_arrival_order() {
        let backend = FakeRecorderBackend::supporting(&["video/webm"]);
        let mut s = session(&backend);
        s.start().unwrap();

        let sink = backend.last();
        for segment in [&b"\x1a\x45"[..], b"\xdf\xa3", b"\x93"] {
            sink.deliver(segment);
        }
        s.stop().unwrap();

        let (blob, summary) = s.finalize("capture").unwrap();
        assert_eq!(blob.data(), b"\x1a\x45\xdf\xa3\x93");
        assert_eq!(blob.mime_type(), "video/webm");
        assert_eq!(summary.file_name, "capture.webm");
        assert_eq!(summary.byte_len, 5);
    }

    #[test]
    fn empty_segments_are_skipped() {
        let backend = FakeRecorderBackend::supporting(&["video/webm"]);
        let mut s = session(&backend);
        s.start().unwrap();
        backend.last().deliver(b"");
        s.stop().unwrap();

        assert_eq!(s.chunk_count(), 0);
    }

    #[test]
    fn empty_recording_triggers_no_download() {
        let backend = FakeRecorderBackend::supporting(&["video/mp4"]);
        let saver = RecordingSaver::new();
        let downloader = Downloader::new(saver.clone(), Duration::ZERO);
        let mut s = session(&backend);
        s.start().unwrap();
        s.stop().unwrap();

        let err = s.finalize_and_download(&downloader, "capture").unwrap_err();
        assert_eq!(err, WebcamError::EmptyRecording);
        assert!(saver.saved().is_empty());
    }

    #[test]
    fn finalize_while_recording_is_rejected() {
        let backend = FakeRecorderBackend::supporting(&["video/mp4"]);
        let mut s = session(&backend);
        s.start().unwrap();
        backend.last().deliver(b"data");

        assert!(matches!(s.finalize("capture"), Err(WebcamError::ConfigurationFailed(_))));
    }

    #[test]
    fn late_segments_after_finalize_are_dropped() {
        let backend = FakeRecorderBackend::supporting(&["video/mp4"]);
        let mut s = session(&backend);
        s.start().unwrap();
        let sink = backend.last();
        sink.deliver(b"a");
        s.stop().unwrap();
        s.finalize("capture").unwrap();

        sink.deliver(b"late");
        assert_eq!(s.chunk_count(), 0);
        assert_eq!(s.finalize("capture").unwrap_err(), WebcamError::EmptyRecording);
    }

    #[test]
    fn finalize_and_download_names_file_by_extension() {
        let backend = FakeRecorderBackend::supporting(&["video/mp4", "video/webm"]);
        let saver = RecordingSaver::new();
        let downloader = Downloader::new(saver.clone(), Duration::ZERO);
        let mut s = session(&backend);
        s.start().unwrap();
        backend.last().deliver(b"ftyp");
        s.stop().unwrap();

        let (receipt, summary) = s.finalize_and_download(&downloader, "capture").unwrap();
        assert_eq!(receipt.file_name, "capture.mp4");
        assert_eq!(receipt.mime_type, "video/mp4");
        assert_eq!(summary.mime_type, "video/mp4");
        assert_eq!(saver.saved(), vec![("capture.mp4".to_string(), b"ftyp".to_vec())]);
    }

    #[test]
    fn blob_carries_the_sink_reported_type() {
        let backend = FakeRecorderBackend::negotiating(&["video/webm"], "video/webm;codecs=vp8");
        let mut s = session(&backend);
        s.start().unwrap();
        backend.last().deliver(b"\x1a\x45\xdf\xa3");
        s.stop().unwrap();

        let (blob, summary) = s.finalize("capture").unwrap();
        assert_eq!(blob.mime_type(), "video/webm;codecs=vp8");
        assert_eq!(summary.mime_type, "video/webm;codecs=vp8");
        assert_eq!(summary.file_name, "capture.webm");
    }

    #[test]
    fn dropping_a_live_session_stops_the_sink() {
        let backend = FakeRecorderBackend::supporting(&["video/mp4"]);
        let mut s = session(&backend);
        s.start().unwrap();
        let sink = backend.last();
        drop(s);
        assert!(sink.is_stopped());
    }
}
