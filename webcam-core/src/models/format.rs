use serde::{Deserialize, Serialize};

use crate::models::error::WebcamError;
use crate::traits::media_recorder::RecorderBackend;

/// A recording container and the file suffix used when saving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub mime_type: String,
    /// Includes the leading dot, e.g. `.webm`.
    pub extension: String,
}

impl OutputFormat {
    pub fn new(mime_type: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            extension: extension.into(),
        }
    }

    /// MP4 first: it is the only container iOS hosts can record.
    pub fn mp4() -> Self {
        Self::new("video/mp4", ".mp4")
    }

    pub fn webm() -> Self {
        Self::new("video/webm", ".webm")
    }

    /// File name for a recording saved with this format.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}{}", stem, self.extension)
    }
}

/// Default container preference order.
pub fn default_preference() -> Vec<OutputFormat> {
    vec![OutputFormat::mp4(), OutputFormat::webm()]
}

/// Pick the first format in `preference` the backend can record.
pub fn select_output_format(
    backend: &dyn RecorderBackend,
    preference: &[OutputFormat],
) -> Result<OutputFormat, WebcamError> {
    preference
        .iter()
        .find(|format| backend.is_type_supported(&format.mime_type))
        .cloned()
        .ok_or(WebcamError::UnsupportedFormat)
}
