use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChainResult;

/// A ledger object exactly as the node returned it.
///
/// Kept untyped: blob objects written by different package versions do not
/// share one schema, so fields are pulled out defensively by
/// [`crate::extract_record`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawChainObject(pub Value);

impl RawChainObject {
    /// The object's own ledger id, when present.
    pub fn object_id(&self) -> Option<&str> {
        self.0.pointer("/data/objectId").and_then(Value::as_str)
    }
}

/// Parameters for one page of an owned-objects query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedObjectsQuery {
    pub owner: String,
    pub struct_type: String,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

/// One page of owned objects.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectsPage {
    #[serde(default)]
    pub data: Vec<RawChainObject>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A single coin object; `balance` is a decimal string in native units.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    #[serde(default)]
    pub coin_object_id: Option<String>,
    pub balance: String,
}

/// One page of coins.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinsPage {
    #[serde(default)]
    pub data: Vec<Coin>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Read access to the ledger.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// One page of objects of `query.struct_type` owned by `query.owner`,
    /// with content, display, and owner sections included.
    async fn get_owned_objects(&self, query: &OwnedObjectsQuery) -> ChainResult<ObjectsPage>;

    /// One page of coins of `coin_type` owned by `owner`.
    async fn get_coins(
        &self,
        owner: &str,
        coin_type: &str,
        cursor: Option<&str>,
    ) -> ChainResult<CoinsPage>;

    /// Sequence number of the latest checkpoint. Used as a liveness probe.
    async fn latest_checkpoint(&self) -> ChainResult<u64>;
}
