//! Error types for credential storage

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore)
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store cannot be reached (no window, storage disabled, ...)
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    /// Reading or writing the backing file failed
    #[error("Storage IO failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not hold a JSON object of strings
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Errors raised while reading or writing the stored user record
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The value under the user key is not a JSON object
    #[error("Stored user is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}
