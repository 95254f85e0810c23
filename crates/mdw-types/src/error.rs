use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid decimal string: {0}")]
    InvalidDecimal(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid url-safe base64 string: {0}")]
    InvalidBase64(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
