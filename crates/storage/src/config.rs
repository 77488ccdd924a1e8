use crate::{LocalSink, S3Sink, StorageError, StorageResult, VariantSink};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageType {
    Local {
        path: PathBuf,
    },
    S3 {
        bucket: String,
        region: String,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        endpoint: Option<String>,
    },
}

impl Default for StorageType {
    fn default() -> Self {
        Self::Local {
            path: std::env::temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub storage_type: StorageType,

    /// Hostname substituted into generated retrieval URLs.
    pub public_domain: String,
}

impl StorageConfig {
    /// Create a variant sink from the configuration. The sink holds the one
    /// configured client/credential context reused across concurrent calls.
    pub async fn create_sink(&self) -> StorageResult<Arc<dyn VariantSink>> {
        match &self.storage_type {
            StorageType::Local { path } => {
                if !path.exists() {
                    tokio::fs::create_dir_all(path).await.map_err(|e| {
                        StorageError::Backend(format!("Failed to create storage directory: {}", e))
                    })?;
                }

                Ok(Arc::new(LocalSink::new(
                    path.clone(),
                    self.public_domain.clone(),
                )))
            }

            StorageType::S3 {
                bucket,
                region,
                access_key_id,
                secret_access_key,
                endpoint,
            } => {
                let mut config_builder = aws_sdk_s3::config::Builder::new()
                    .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                    .region(aws_sdk_s3::config::Region::new(region.clone()));

                // Custom endpoint for S3-compatible services like R2 or MinIO
                if let Some(endpoint_url) = endpoint {
                    config_builder = config_builder.endpoint_url(endpoint_url);
                }

                // Explicit credentials if provided, else the ambient chain
                if let (Some(access_key), Some(secret_key)) = (access_key_id, secret_access_key) {
                    let credentials = aws_sdk_s3::config::Credentials::new(
                        access_key,
                        secret_key,
                        None,
                        None,
                        "imagemill-config",
                    );
                    config_builder = config_builder.credentials_provider(credentials);
                }

                let config = config_builder.build();
                let client = aws_sdk_s3::Client::from_conf(config);

                Ok(Arc::new(S3Sink::new(
                    client,
                    bucket.clone(),
                    self.public_domain.clone(),
                )))
            }
        }
    }
}
