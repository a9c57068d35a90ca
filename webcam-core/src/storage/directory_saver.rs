use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::error::WebcamError;
use crate::storage::object_url::ObjectUrlRegistry;
use crate::traits::file_saver::{DownloadLink, FileSaver};

/// Saves downloads into a local directory.
///
/// Only the final component of the suggested name is used, so a link can
/// never write outside `directory`. Existing files are overwritten.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    directory: PathBuf,
}

impl DirectorySaver {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where a download with `file_name` ends up.
    pub fn target_path(&self, file_name: &str) -> Result<PathBuf, WebcamError> {
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| WebcamError::StorageError(format!("invalid file name: {:?}", file_name)))?;
        Ok(self.directory.join(name))
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, link: &DownloadLink, registry: &Arc<ObjectUrlRegistry>) -> Result<(), WebcamError> {
        let blob = registry
            .resolve(&link.url)
            .ok_or_else(|| WebcamError::StorageError(format!("object url {} was revoked", link.url)))?;

        let path = self.target_path(&link.file_name)?;
        fs::create_dir_all(&self.directory)
            .map_err(|e| WebcamError::StorageError(format!("failed to create directory: {}", e)))?;
        fs::write(&path, blob.data())
            .map_err(|e| WebcamError::StorageError(format!("failed to write {}: {}", path.display(), e)))?;

        log::info!("Saved {} ({} bytes)", path.display(), blob.len());
        Ok(())
    }
}
