use thiserror::Error;

/// Errors raised by key-value backends.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read stored value: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("Failed to write stored value: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("Failed to parse data: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to create directory: {0}")]
    DirectoryError(String),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

impl StorageError {
    pub fn directory(msg: impl Into<String>) -> Self {
        StorageError::DirectoryError(msg.into())
    }

    pub fn invalid_key(key: impl Into<String>) -> Self {
        StorageError::InvalidKey(key.into())
    }
}
