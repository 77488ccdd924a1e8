use crate::StorageResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A persisted derivative image: where it can be retrieved from and the
/// metadata re-derived from the stored bytes (not from what the caller
/// requested).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Persistence target for derivative images. Implementations must be safe
/// to call concurrently; a stored object is never rolled back.
#[async_trait]
pub trait VariantSink: Send + Sync {
    async fn store(&self, filename: &str, data: &[u8]) -> StorageResult<StoredObject>;
}
