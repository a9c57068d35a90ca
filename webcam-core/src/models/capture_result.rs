use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A still frame encoded as JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillImage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl StillImage {
    /// Result of capturing from a preview with no visible area.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            jpeg: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }
}

/// Description of a finalized recording.
///
/// Serializable so hosts can forward it to their UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub id: String,
    pub mime_type: String,
    pub file_name: String,
    pub chunk_count: usize,
    pub byte_len: u64,
    /// SHA-256 of the concatenated payload, lowercase hex.
    pub checksum: String,
    pub started_at: String,
    pub stopped_at: String,
    pub duration_secs: f64,
}

impl RecordingSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &str,
        mime_type: &str,
        file_name: &str,
        chunk_count: usize,
        payload: &[u8],
        started_at: DateTime<Utc>,
        stopped_at: DateTime<Utc>,
    ) -> Self {
        let duration_secs = (stopped_at - started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            id: id.to_string(),
            mime_type: mime_type.to_string(),
            file_name: file_name.to_string(),
            chunk_count,
            byte_len: payload.len() as u64,
            checksum: sha256_hex(payload),
            started_at: started_at.to_rfc3339(),
            stopped_at: stopped_at.to_rfc3339(),
            duration_secs,
        }
    }
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{:02x}", b)).collect()
}
