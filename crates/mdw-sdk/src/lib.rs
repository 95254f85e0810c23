//! High-level SDK for md2walrus.
//!
//! Saves Markdown documents to decentralized blob storage and keeps a local
//! library of what an address has stored. [`Md2Walrus`] wires everything for
//! one network; the pieces are usable on their own.
//!
//! # Key Types
//!
//! - [`SaveOrchestrator`]: One save at a time through encode, register, upload, certify
//! - [`ClientLifecycle`]: Lazily initialized, shared storage client per network
//! - [`BlobLibrary`]: Ledger listing reconciled with the local cache
//! - [`SaveFailure`]: Classified, user-facing failure of a save

pub mod app;
pub mod classify;
pub mod config;
pub mod error;
pub mod file;
pub mod flow;
pub mod library;
pub mod lifecycle;
pub mod orchestrator;
pub mod ports;
pub mod retry;

pub use app::Md2Walrus;
pub use classify::{classify_message, ErrorClass};
pub use config::{CacheConfig, LifecycleConfig, SaveConfig, SdkConfig};
pub use error::{ExternalError, FailureKind, SaveFailure, SdkError, SdkResult};
pub use file::MarkdownFile;
pub use library::{estimate_cost, BlobLibrary};
pub use lifecycle::ClientLifecycle;
pub use orchestrator::{SaveOrchestrator, SaveReceipt};
pub use ports::{
    ClientFactory, ConnectivityGate, RegisterParams, StorageClient, Transaction,
    TransactionDigest, TransactionKind, WalletSigner, WriteFlow, WrittenFile,
};
pub use retry::RetryPolicy;

// Re-export key types
pub use mdw_types::{BlobRecord, Network, SaveStage, SaveState};
pub use mdw_probe::{NetworkReport, ProbeConfig};
pub use mdw_chain::ChainConfig;
