use std::sync::Arc;

use crate::models::error::WebcamError;
use crate::storage::object_url::{ObjectUrl, ObjectUrlRegistry};

/// A save-as-file request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: ObjectUrl,
    pub file_name: String,
}

/// Platform save mechanism.
///
/// The URL stays resolvable in `registry` until the downloader's release
/// delay elapses, so savers may read it after `save` returns.
pub trait FileSaver: Send + Sync {
    fn save(&self, link: &DownloadLink, registry: &Arc<ObjectUrlRegistry>) -> Result<(), WebcamError>;
}
