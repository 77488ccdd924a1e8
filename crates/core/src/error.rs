use imagemill_storage::StorageError;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No source image present")]
    MissingSource,

    #[error("Invalid list of operations: {0}")]
    MalformedOperations(#[from] serde_json::Error),

    #[error("Invalid operation: {0}")]
    Validation(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transform<S: Into<String>>(msg: S) -> Self {
        Self::Transform(msg.into())
    }

    /// Client-caused errors resolve at the boundary as 400s; everything else
    /// is an internal processing failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSource
                | Self::MalformedOperations(_)
                | Self::Validation(_)
                | Self::UnsupportedFormat(_)
        )
    }
}
