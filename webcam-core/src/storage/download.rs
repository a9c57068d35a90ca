use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::error::WebcamError;
use crate::storage::object_url::{Blob, ObjectUrl, ObjectUrlRegistry};
use crate::traits::file_saver::{DownloadLink, FileSaver};

/// Outcome of a triggered download.
#[derive(Debug)]
pub struct DownloadReceipt {
    pub file_name: String,
    pub url: ObjectUrl,
    pub mime_type: String,
    pub byte_len: u64,
    release: Option<thread::JoinHandle<()>>,
}

impl DownloadReceipt {
    /// Whether the object URL revocation is still scheduled.
    pub fn is_release_pending(&self) -> bool {
        self.release.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Block until the object URL has been revoked.
    pub fn wait_for_release(&mut self) {
        if let Some(handle) = self.release.take() {
            let _ = handle.join();
        }
    }
}

/// Delivers payloads through a `FileSaver` and revokes their object URLs
/// after a grace period.
#[derive(Clone)]
pub struct Downloader {
    saver: Arc<dyn FileSaver>,
    registry: Arc<ObjectUrlRegistry>,
    release_delay: Duration,
}

impl Downloader {
    pub fn new(saver: Arc<dyn FileSaver>, release_delay: Duration) -> Self {
        Self {
            saver,
            registry: Arc::new(ObjectUrlRegistry::new()),
            release_delay,
        }
    }

    pub fn registry(&self) -> &Arc<ObjectUrlRegistry> {
        &self.registry
    }

    pub fn release_delay(&self) -> Duration {
        self.release_delay
    }

    /// Register `blob`, trigger the save action and schedule revocation.
    pub fn download(&self, blob: Blob, file_name: &str) -> Result<DownloadReceipt, WebcamError> {
        let mime_type = blob.mime_type().to_string();
        let byte_len = blob.len() as u64;
        let url = self.registry.create(blob);
        let link = DownloadLink {
            url: url.clone(),
            file_name: file_name.to_string(),
        };

        if let Err(e) = self.saver.save(&link, &self.registry) {
            self.registry.revoke(&url);
            log::error!("Failed to save {}: {}", file_name, e);
            return Err(e);
        }
        log::info!("Download triggered: {} ({} bytes, {})", file_name, byte_len, mime_type);

        let release = self.schedule_release(url.clone());

        Ok(DownloadReceipt {
            file_name: link.file_name,
            url,
            mime_type,
            byte_len,
            release,
        })
    }

    fn schedule_release(&self, url: ObjectUrl) -> Option<thread::JoinHandle<()>> {
        if self.release_delay.is_zero() {
            self.registry.revoke(&url);
            return None;
        }

        let registry = Arc::clone(&self.registry);
        let delay = self.release_delay;
        let spawned = thread::Builder::new()
            .name("object-url-release".into())
            .spawn({
                let url = url.clone();
                move || {
                    thread::sleep(delay);
                    registry.revoke(&url);
                    log::debug!("Revoked {}", url);
                }
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Failed to schedule release of {}, revoking now: {}", url, e);
                self.registry.revoke(&url);
                None
            }
        }
    }
}
