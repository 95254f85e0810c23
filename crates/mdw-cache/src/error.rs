/// Errors from cache and key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be represented by this backend.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The backing store is not available.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
