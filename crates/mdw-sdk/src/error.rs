use mdw_cache::CacheError;
use mdw_chain::ChainError;
use mdw_probe::ProbeError;
use serde::Serialize;
use thiserror::Error;

/// A failure reported by an external collaborator (wallet, storage SDK).
///
/// These arrive as free text; [`crate::classify`] is the only place that
/// interprets the message.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExternalError {
    pub message: String,
}

impl ExternalError {
    /// Wrap a collaborator message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ExternalError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ExternalError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("storage client initialization failed after {attempts} attempt(s): {message}")]
    ClientInit { attempts: u32, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    External(#[from] ExternalError),
}

pub type SdkResult<T> = Result<T, SdkError>;

/// Category of a terminal save failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No wallet account is connected.
    WalletNotConnected,
    /// The storage client could not be initialized.
    ClientNotReady,
    /// Another save is still running.
    SaveInProgress,
    /// Internet or ledger RPC unreachable before any paid step.
    Connectivity,
    InsufficientBalance,
    /// Retries ran out on network-class errors.
    NetworkExhausted,
    UploadTimeout,
    Other,
}

impl FailureKind {
    /// Precondition failures never enter the state machine.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::WalletNotConnected | Self::ClientNotReady | Self::SaveInProgress
        )
    }
}

/// A classified, user-facing save failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct SaveFailure {
    pub kind: FailureKind,
    /// One human-readable sentence.
    pub message: String,
    /// Actionable follow-up, when there is one.
    pub guidance: Option<String>,
    /// Required amount in whole WAL, for balance failures that carried one.
    pub required_wal: Option<u128>,
}

impl SaveFailure {
    /// A failure without guidance.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            guidance: None,
            required_wal: None,
        }
    }

    /// Attach a follow-up hint.
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = Some(guidance.into());
        self
    }
}
