use crate::{probe, StorageError, StorageResult, StoredObject, VariantSink};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Writes derivatives to durable local storage under a base directory.
pub struct LocalSink {
    base_path: PathBuf,
    public_domain: String,
}

impl LocalSink {
    pub fn new(base_path: PathBuf, public_domain: String) -> Self {
        Self {
            base_path,
            public_domain,
        }
    }

    /// Validate and sanitize the derivative filename to prevent directory
    /// traversal via a hostile name prefix.
    fn validate_filename(&self, filename: &str) -> StorageResult<PathBuf> {
        let clean = filename.trim_start_matches('/');

        if clean.is_empty() {
            return Err(StorageError::InvalidFilename("empty filename".to_string()));
        }

        if clean.contains("..") || clean.contains("./") {
            return Err(StorageError::InvalidFilename(format!(
                "filename contains invalid sequences: {}",
                filename
            )));
        }

        let full_path = self.base_path.join(clean);

        if !full_path.starts_with(&self.base_path) {
            return Err(StorageError::InvalidFilename(format!(
                "filename escapes base directory: {}",
                filename
            )));
        }

        Ok(full_path)
    }

    async fn ensure_parent_dir(&self, file_path: &Path) -> StorageResult<()> {
        if let Some(parent) = file_path.parent() {
            if !parent.exists() {
                debug!("Creating directory: {:?}", parent);
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VariantSink for LocalSink {
    async fn store(&self, filename: &str, data: &[u8]) -> StorageResult<StoredObject> {
        let file_path = self.validate_filename(filename)?;

        debug!("Storing derivative at: {:?}", file_path);

        self.ensure_parent_dir(&file_path).await?;

        fs::write(&file_path, data).await?;

        // Metadata comes from what landed on disk, not from the request.
        let written = fs::read(&file_path).await?;
        let info = probe(&written)?;

        debug!(
            "Stored derivative: {} bytes, {}x{} {}",
            written.len(),
            info.width,
            info.height,
            info.format
        );

        Ok(StoredObject {
            url: format!("{}/{}", self.public_domain, filename.trim_start_matches('/')),
            width: info.width,
            height: info.height,
            format: info.format,
        })
    }
}
