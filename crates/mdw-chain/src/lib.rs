//! Ledger queries for md2walrus.
//!
//! Lists the blob objects an address owns, turns each raw ledger object into
//! a [`mdw_types::BlobRecord`], and reads WAL coin balances. The ledger is
//! reached through the [`LedgerRpc`] port; [`JsonRpcClient`] implements it
//! over HTTP JSON-RPC.

pub mod config;
pub mod error;
pub mod extract;
pub mod jsonrpc;
pub mod query;
pub mod rpc;

pub use config::ChainConfig;
pub use error::{ChainError, ChainResult};
pub use extract::extract_record;
pub use jsonrpc::JsonRpcClient;
pub use query::ChainQuery;
pub use rpc::{Coin, CoinsPage, LedgerRpc, ObjectsPage, OwnedObjectsQuery, RawChainObject};
