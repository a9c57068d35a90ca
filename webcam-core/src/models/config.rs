use std::time::Duration;

use super::format::{default_preference, OutputFormat};

/// Configuration shared by the display and its recording sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct WebcamConfiguration {
    /// Interval at which the recording sink delivers segments (default: 1 s).
    pub timeslice: Duration,

    /// How long a download's object URL stays resolvable after the save
    /// action is triggered (default: 10 s).
    pub url_release_delay: Duration,

    /// File name for still captures (default: `capture.jpg`).
    pub still_file_name: String,

    /// Recording file name without extension (default: `capture`).
    pub recording_file_stem: String,

    /// JPEG quality, 1-100 (default: 92).
    pub jpeg_quality: u8,

    /// Container formats to try, in order.
    pub format_preference: Vec<OutputFormat>,
}

impl WebcamConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.timeslice.is_zero() {
            return Err("timeslice must be positive".into());
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!("unsupported jpeg quality: {}", self.jpeg_quality));
        }
        if self.still_file_name.trim().is_empty() {
            return Err("still file name must not be empty".into());
        }
        if self.recording_file_stem.trim().is_empty() {
            return Err("recording file stem must not be empty".into());
        }
        if self.format_preference.is_empty() {
            return Err("format preference list is empty".into());
        }
        Ok(())
    }
}

impl Default for WebcamConfiguration {
    fn default() -> Self {
        Self {
            timeslice: Duration::from_secs(1),
            url_release_delay: Duration::from_secs(10),
            still_file_name: "capture.jpg".into(),
            recording_file_stem: "capture".into(),
            jpeg_quality: 92,
            format_preference: default_preference(),
        }
    }
}
