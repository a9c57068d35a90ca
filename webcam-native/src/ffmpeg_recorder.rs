//! Recording sink that pipes raw frames through an `ffmpeg` child process.
//!
//! ffmpeg writes a streamable container (fragmented MP4 or WebM) to stdout;
//! the output is cut into one segment per timeslice and handed to the
//! session callback.

use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use webcam_core::{MediaRecorder, RecorderBackend, SegmentCallback, StreamHandle, WebcamError};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Containers ffmpeg can write to a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mp4,
    Webm,
}

impl Container {
    /// Parse a MIME type, ignoring parameters such as `codecs=`.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let essence = mime_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "video/mp4" => Some(Self::Mp4),
            "video/webm" => Some(Self::Webm),
            _ => None,
        }
    }
}

/// ffmpeg arguments reading `rgb24` frames from stdin and writing the
/// container to stdout.
pub fn build_args(container: Container, width: u32, height: u32, fps: u32) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pixel_format",
        "rgb24",
        "-video_size",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(format!("{}x{}", width, height));
    args.push("-framerate".into());
    args.push(fps.to_string());
    args.push("-i".into());
    args.push("-".into());

    let enc_args: &[&str] = match container {
        Container::Mp4 => &[
            "-c:v", "libx264", "-pix_fmt", "yuv420p", "-preset", "veryfast", "-tune", "zerolatency",
            "-movflags", "frag_keyframe+empty_moov+default_base_moof", "-f", "mp4",
        ],
        Container::Webm => &[
            "-c:v", "libvpx", "-pix_fmt", "yuv420p", "-deadline", "realtime", "-b:v", "2M", "-f", "webm",
        ],
    };
    args.extend(enc_args.iter().map(|s| s.to_string()));
    args.push("-".into());
    args
}

/// `RecorderBackend` backed by an ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegRecorderBackend {
    ffmpeg: PathBuf,
    fps: u32,
    available: bool,
}

impl FfmpegRecorderBackend {
    /// `ffmpeg` from `PATH`, 30 fps.
    pub fn new() -> Self {
        Self::with_binary("ffmpeg", 30)
    }

    pub fn with_binary(ffmpeg: impl Into<PathBuf>, fps: u32) -> Self {
        let ffmpeg = ffmpeg.into();
        let available = answers_version(&ffmpeg);
        if !available {
            log::warn!("ffmpeg not usable at {}, recording disabled", ffmpeg.display());
        }
        Self {
            ffmpeg,
            fps: fps.max(1),
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl Default for FfmpegRecorderBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn answers_version(ffmpeg: &Path) -> bool {
    Command::new(ffmpeg)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

impl RecorderBackend for FfmpegRecorderBackend {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.available && Container::from_mime(mime_type).is_some()
    }

    fn create_recorder(
        &self,
        stream: StreamHandle,
        mime_type: &str,
        on_data: SegmentCallback,
    ) -> Result<Box<dyn MediaRecorder>, WebcamError> {
        let container = Container::from_mime(mime_type).ok_or(WebcamError::UnsupportedFormat)?;
        if !self.available {
            return Err(WebcamError::UnsupportedFormat);
        }
        Ok(Box::new(FfmpegRecorder {
            ffmpeg: self.ffmpeg.clone(),
            container,
            mime_type: mime_type.to_string(),
            fps: self.fps,
            stream,
            on_data,
            running: Arc::new(AtomicBool::new(false)),
            child: None,
            feeder: None,
            reader: None,
            segmenter: None,
        }))
    }
}

/// One ffmpeg encode of a live stream.
///
/// Threads:
/// - feeder: writes the stream's current frame to stdin at the target rate
/// - reader: drains stdout into a channel
/// - segmenter: emits accumulated bytes every timeslice, then the remainder
pub struct FfmpegRecorder {
    ffmpeg: PathBuf,
    container: Container,
    mime_type: String,
    fps: u32,
    stream: StreamHandle,
    on_data: SegmentCallback,
    running: Arc<AtomicBool>,
    child: Option<Child>,
    feeder: Option<thread::JoinHandle<()>>,
    reader: Option<thread::JoinHandle<()>>,
    segmenter: Option<thread::JoinHandle<()>>,
}

impl MediaRecorder for FfmpegRecorder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn start(&mut self, timeslice: Duration) -> Result<(), WebcamError> {
        if self.child.is_some() {
            return Err(WebcamError::AlreadyRecording);
        }

        let first = self
            .stream
            .current_frame()
            .ok_or_else(|| WebcamError::DeviceUnavailable("stream has not produced a frame".into()))?;
        let (width, height) = (first.width(), first.height());

        let args = build_args(self.container, width, height, self.fps);
        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| WebcamError::EncodingFailed(format!("failed to spawn ffmpeg: {}", e)))?;

        let (mut stdin, mut stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                abort_child(&mut child, &self.running);
                return Err(WebcamError::EncodingFailed("ffmpeg stdio unavailable".into()));
            }
        };

        self.running.store(true, Ordering::SeqCst);

        let feeder = {
            let running = Arc::clone(&self.running);
            let stream = Arc::clone(&self.stream);
            let interval = Duration::from_secs_f64(1.0 / self.fps as f64);
            thread::Builder::new()
                .name("ffmpeg-feeder".into())
                .spawn(move || {
                    while running.load(Ordering::SeqCst) {
                        let tick = Instant::now();
                        match stream.current_frame() {
                            Some(frame) if (frame.width(), frame.height()) == (width, height) => {
                                if let Err(e) = stdin.write_all(frame.data()) {
                                    log::error!("Failed to feed ffmpeg: {}", e);
                                    break;
                                }
                            }
                            Some(frame) => {
                                log::debug!(
                                    "Skipping {}x{} frame, encoder expects {}x{}",
                                    frame.width(),
                                    frame.height(),
                                    width,
                                    height
                                );
                            }
                            None if !stream.is_active() => break,
                            None => {}
                        }
                        thread::sleep(interval.saturating_sub(tick.elapsed()));
                    }
                    // dropping stdin signals end of input
                })
        };
        let feeder = match feeder {
            Ok(handle) => handle,
            Err(e) => {
                abort_child(&mut child, &self.running);
                return Err(WebcamError::EncodingFailed(format!("failed to spawn feeder thread: {}", e)));
            }
        };

        let (tx, rx) = crossbeam_channel::unbounded::<Vec<u8>>();

        let reader = thread::Builder::new()
            .name("ffmpeg-reader".into())
            .spawn(move || {
                let mut buf = vec![0u8; READ_BUFFER_SIZE];
                loop {
                    match stdout.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                        Err(e) => {
                            log::error!("Failed to read ffmpeg output: {}", e);
                            break;
                        }
                    }
                }
            });
        let reader = match reader {
            Ok(handle) => handle,
            Err(e) => {
                abort_child(&mut child, &self.running);
                return Err(WebcamError::EncodingFailed(format!("failed to spawn reader thread: {}", e)));
            }
        };

        let segmenter = {
            let on_data = Arc::clone(&self.on_data);
            thread::Builder::new()
                .name("ffmpeg-segmenter".into())
                .spawn(move || segment_loop(rx, timeslice, on_data))
        };
        let segmenter = match segmenter {
            Ok(handle) => handle,
            Err(e) => {
                abort_child(&mut child, &self.running);
                return Err(WebcamError::EncodingFailed(format!("failed to spawn segmenter thread: {}", e)));
            }
        };

        self.child = Some(child);
        self.feeder = Some(feeder);
        self.reader = Some(reader);
        self.segmenter = Some(segmenter);
        log::info!("ffmpeg recording {}x{}@{}fps as {}", width, height, self.fps, self.mime_type);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), WebcamError> {
        let mut child = self.child.take().ok_or(WebcamError::NotRecording)?;

        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.feeder.take() {
            let _ = handle.join();
        }

        let status = child
            .wait()
            .map_err(|e| WebcamError::EncodingFailed(format!("failed to wait for ffmpeg: {}", e)));

        // the trailing segment is delivered once stdout reaches EOF
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.segmenter.take() {
            let _ = handle.join();
        }

        let status = status?;
        if !status.success() {
            log::error!("ffmpeg exited with {}", status);
            return Err(WebcamError::EncodingFailed(format!("ffmpeg exited with {}", status)));
        }
        Ok(())
    }
}

/// Slice `rx` into one segment per `timeslice`, then flush the remainder
/// once the sender side disconnects. Empty slices are not emitted.
fn segment_loop(rx: Receiver<Vec<u8>>, timeslice: Duration, on_data: SegmentCallback) {
    let mut pending: Vec<u8> = Vec::new();
    let mut deadline = Instant::now() + timeslice;
    loop {
        match rx.recv_deadline(deadline) {
            Ok(bytes) => pending.extend_from_slice(&bytes),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if Instant::now() >= deadline {
            if !pending.is_empty() {
                on_data(std::mem::take(&mut pending));
            }
            deadline += timeslice;
        }
    }
    if !pending.is_empty() {
        on_data(pending);
    }
}

/// Tear down a started encoder whose worker threads could not be set up.
fn abort_child(child: &mut Child, running: &AtomicBool) {
    running.store(false, Ordering::SeqCst);
    if let Err(e) = child.kill() {
        log::warn!("Failed to kill ffmpeg: {}", e);
    }
    let _ = child.wait();
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(e) = self.stop() {
                log::warn!("ffmpeg recorder dropped mid-recording: {}", e);
            }
        }
    }
}
