//! Interfaces to the collaborators this crate drives but does not own: the
//! wallet, the storage SDK, and the connectivity gate.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use mdw_probe::{NetworkProbe, NetworkReport};
use mdw_types::Network;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExternalError;
use crate::file::MarkdownFile;

/// Which write step built a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Register,
    Certify,
}

/// An unsigned transaction built by the storage SDK. Opaque to this crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub payload: Value,
}

impl Transaction {
    /// Wrap an SDK-built payload.
    pub fn new(kind: TransactionKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}

/// Digest of an executed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionDigest(pub String);

impl fmt::Display for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionDigest {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Register step parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterParams {
    pub epochs: u32,
    pub owner: String,
    pub deletable: bool,
}

/// One file produced by a completed write flow.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenFile {
    pub blob_id: String,
}

/// The connected wallet.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Address of the connected account, if any.
    fn current_address(&self) -> Option<String>;

    /// Sign and execute. Fails if the user rejects or signing fails.
    async fn sign_and_execute(&self, tx: Transaction) -> Result<TransactionDigest, ExternalError>;
}

/// One blob write in the storage SDK.
///
/// Steps must be called in order: `encode`, `register`, `upload`, `certify`,
/// then `list_files`. [`crate::flow`] enforces the order at the type level.
#[async_trait]
pub trait WriteFlow: Send {
    async fn encode(&mut self) -> Result<(), ExternalError>;

    fn register(&mut self, params: &RegisterParams) -> Result<Transaction, ExternalError>;

    async fn upload(&mut self, digest: &TransactionDigest) -> Result<(), ExternalError>;

    fn certify(&mut self) -> Result<Transaction, ExternalError>;

    async fn list_files(&mut self) -> Result<Vec<WrittenFile>, ExternalError>;
}

/// An initialized storage SDK handle.
#[async_trait]
pub trait StorageClient: Send + Sync {
    fn write_flow(&self, file: MarkdownFile) -> Box<dyn WriteFlow>;

    async fn read_blob(&self, blob_id: &str) -> Result<Vec<u8>, ExternalError>;
}

/// Builds storage clients. Construction is expensive and happens at most
/// once per network through [`crate::ClientLifecycle`].
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Check that the client runtime is loaded and usable. Retried by the
    /// lifecycle with a fixed delay.
    async fn load_runtime(&self) -> Result<(), ExternalError>;

    async fn create(&self, network: Network) -> Result<Arc<dyn StorageClient>, ExternalError>;
}

/// Pre-save connectivity check.
#[async_trait]
pub trait ConnectivityGate: Send + Sync {
    async fn check(&self) -> NetworkReport;
}

#[async_trait]
impl ConnectivityGate for NetworkProbe {
    async fn check(&self) -> NetworkReport {
        self.check_all().await
    }
}
