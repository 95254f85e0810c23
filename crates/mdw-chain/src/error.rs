use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("http status {status} from {url}")]
    Http { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("pagination stalled: {0}")]
    Pagination(String),
}

impl From<reqwest::Error> for ChainError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Transport(format!("request timeout: {error}"))
        } else if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
