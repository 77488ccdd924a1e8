use crate::{probe, StorageError, StorageResult, StoredObject, VariantSink};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, error};

const S3_SERVICE_HOST: &str = "s3.amazonaws.com";

/// Uploads derivatives into an S3 bucket under a date-partitioned prefix.
pub struct S3Sink {
    client: Client,
    bucket: String,
    public_domain: String,
}

impl S3Sink {
    pub fn new(client: Client, bucket: String, public_domain: String) -> Self {
        debug!(
            "Initializing S3 sink for bucket '{}' (public domain '{}')",
            bucket, public_domain
        );

        Self {
            client,
            bucket,
            public_domain,
        }
    }

    /// Validate and sanitize the derivative filename before building a key.
    fn validate_filename(&self, filename: &str) -> StorageResult<String> {
        let clean = filename.trim_start_matches('/');

        if clean.is_empty() {
            return Err(StorageError::InvalidFilename("empty filename".to_string()));
        }

        if clean.contains("..") {
            return Err(StorageError::InvalidFilename(format!(
                "filename contains invalid sequences: {}",
                filename
            )));
        }

        Ok(clean.to_string())
    }

    /// Detect content type from the filename extension.
    fn detect_content_type(&self, filename: &str) -> Option<String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("jpg") | Some("jpeg") => Some("image/jpeg".to_string()),
            Some("png") => Some("image/png".to_string()),
            Some("gif") => Some("image/gif".to_string()),
            Some("webp") => Some("image/webp".to_string()),
            Some("bmp") => Some("image/bmp".to_string()),
            Some("tiff") => Some("image/tiff".to_string()),
            Some("ico") => Some("image/x-icon".to_string()),
            Some("avif") => Some("image/avif".to_string()),
            _ => Some("application/octet-stream".to_string()),
        }
    }

    /// Retrieval URL for an uploaded key: the object location with the
    /// storage-service host swapped for the configured public domain.
    fn object_url(&self, key: &str) -> String {
        format!("https://{}.{}/{}", self.bucket, S3_SERVICE_HOST, key)
            .replace(S3_SERVICE_HOST, &self.public_domain)
    }
}

/// Key prefix partitioning uploads by wall-clock date: `<year>/<month>/`,
/// month 1-indexed and not zero-padded.
pub fn date_prefix(date: &DateTime<Utc>) -> String {
    format!("{}/{}/", date.year(), date.month())
}

#[async_trait]
impl VariantSink for S3Sink {
    async fn store(&self, filename: &str, data: &[u8]) -> StorageResult<StoredObject> {
        let key = format!("{}{}", date_prefix(&Utc::now()), self.validate_filename(filename)?);
        let content_type = self.detect_content_type(filename);

        debug!(
            "Uploading derivative to S3: bucket={}, key={}",
            self.bucket, key
        );

        let mut put_request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()));

        if let Some(ct) = &content_type {
            put_request = put_request.content_type(ct);
        }

        put_request.send().await.map_err(|e| {
            error!("Failed to upload derivative to S3: {}", e);
            StorageError::Backend(format!("S3 put_object failed: {}", e))
        })?;

        // Metadata comes from the uploaded bytes, not from the request.
        let info = probe(data)?;

        debug!(
            "Uploaded derivative: {} bytes, {}x{} {}",
            data.len(),
            info.width,
            info.height,
            info.format
        );

        Ok(StoredObject {
            url: self.object_url(&key),
            width: info.width,
            height: info.height,
            format: info.format,
        })
    }
}
