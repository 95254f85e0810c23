use std::sync::Arc;

use mdw_cache::LocalCache;
use mdw_chain::ChainQuery;
use mdw_types::{BlobRecord, Network};
use tracing::{debug, info, warn};

use crate::error::SdkResult;
use crate::lifecycle::ClientLifecycle;

/// Native units charged per started KiB.
const NATIVE_PER_KIB: u128 = 1_000_000;

/// Rough storage cost of `content` in native WAL units: one million per
/// started KiB.
pub fn estimate_cost(content: &str) -> u128 {
    let bytes = content.len() as u128;
    bytes.div_ceil(1024) * NATIVE_PER_KIB
}

/// The documents an address has stored, reconciled between the ledger and
/// the local cache.
pub struct BlobLibrary {
    network: Network,
    query: ChainQuery,
    cache: Arc<LocalCache>,
    lifecycle: Arc<ClientLifecycle>,
}

impl BlobLibrary {
    /// Library for the query's network.
    pub fn new(query: ChainQuery, cache: Arc<LocalCache>, lifecycle: Arc<ClientLifecycle>) -> Self {
        Self {
            network: query.network(),
            query,
            cache,
            lifecycle,
        }
    }

    /// Re-read the ledger for `owner` and fold the results into the cache.
    ///
    /// Ledger fields overwrite cached ones; cached document text is kept.
    /// Returns the owner's records newest first.
    pub async fn refresh(&self, owner: &str) -> SdkResult<Vec<BlobRecord>> {
        let mut records = self.query.owned_records(owner).await?;
        records.sort_by(|a, b| b.created_at_time().cmp(&a.created_at_time()));

        let mut failed = 0usize;
        for record in &records {
            if let Err(e) = self.cache.upsert(record.clone()) {
                failed += 1;
                debug!(blob_id = record.blob_id(), error = %e, "record not cached");
            }
        }
        if failed > 0 {
            warn!(failed, total = records.len(), "some refreshed records were not cached");
        }

        let merged: Vec<BlobRecord> = records
            .into_iter()
            .map(|record| self.cache.get(record.blob_id()).unwrap_or(record))
            .collect();
        info!(network = %self.network, owner, count = merged.len(), "library refreshed");
        Ok(merged)
    }

    /// Everything in the local cache, newest first.
    pub fn cached(&self) -> Vec<BlobRecord> {
        self.cache.list()
    }

    /// Text of a stored blob, or `None` if it cannot be read for any reason.
    pub async fn read_content(&self, blob_id: &str) -> Option<String> {
        let client = match self.lifecycle.get(self.network).await {
            Ok(client) => client,
            Err(e) => {
                warn!(blob_id, error = %e, "no storage client, cannot read blob");
                return None;
            }
        };
        let bytes = match client.read_blob(blob_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(blob_id, error = %e, "blob read failed");
                return None;
            }
        };
        match String::from_utf8(bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(blob_id, error = %e, "blob is not UTF-8 text");
                None
            }
        }
    }

    /// WAL balance of `owner` in native units.
    pub async fn wal_balance(&self, owner: &str) -> SdkResult<u128> {
        Ok(self.query.wal_balance(owner).await?)
    }
}
