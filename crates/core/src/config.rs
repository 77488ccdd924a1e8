use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Process-wide configuration, fixed at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64,
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            request_timeout: 30,
            max_request_size: 25 * 1024 * 1024, // 25MB
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    pub backend: BackendKind,
    pub public_domain: String,
    pub local: LocalSettings,
    pub s3: S3Settings,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            public_domain: "http://localhost:8090".to_string(),
            local: LocalSettings::default(),
            s3: S3Settings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalSettings {
    pub base_path: PathBuf,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            base_path: std::env::temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            bucket: "imagemill-variants".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FeatureFlags {
    /// Reject operations whose output format the engine cannot encode,
    /// instead of letting the transform step fail. Off by default to match
    /// the observed behavior of treating the format list as informational.
    #[serde(default)]
    pub enforce_supported_formats: bool,
}
