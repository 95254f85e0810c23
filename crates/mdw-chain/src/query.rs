use std::sync::Arc;

use mdw_types::{BlobRecord, Network};
use tracing::{debug, info, warn};

use crate::config::ChainConfig;
use crate::error::{ChainError, ChainResult};
use crate::extract::extract_record;
use crate::rpc::{LedgerRpc, OwnedObjectsQuery, RawChainObject};

/// Queries against the ledger for one network.
#[derive(Clone)]
pub struct ChainQuery {
    rpc: Arc<dyn LedgerRpc>,
    network: Network,
    config: ChainConfig,
}

impl ChainQuery {
    /// Queries through `rpc` for `network`.
    pub fn new(rpc: Arc<dyn LedgerRpc>, network: Network, config: ChainConfig) -> Self {
        Self {
            rpc,
            network,
            config,
        }
    }

    /// Network queried.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Underlying RPC client.
    pub fn rpc(&self) -> &Arc<dyn LedgerRpc> {
        &self.rpc
    }

    /// Every blob object owned by `owner`, following the cursor across all
    /// pages.
    ///
    /// Fails if the node advertises another page without a fresh cursor
    /// rather than returning a truncated listing.
    pub async fn list_owned_blobs(&self, owner: &str) -> ChainResult<Vec<RawChainObject>> {
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let query = OwnedObjectsQuery {
                owner: owner.to_string(),
                struct_type: self.config.blob_struct_type.clone(),
                cursor: cursor.clone(),
                limit: self.config.page_size,
            };
            let page = self.rpc.get_owned_objects(&query).await?;
            pages += 1;
            debug!(
                network = %self.network,
                page = pages,
                count = page.data.len(),
                has_next_page = page.has_next_page,
                "fetched owned blob page"
            );
            objects.extend(page.data);

            if !page.has_next_page {
                break;
            }
            match page.next_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                other => {
                    warn!(page = pages, cursor = ?other, "node advertised more pages without advancing");
                    return Err(ChainError::Pagination(format!(
                        "page {pages} reported more results but cursor {other:?} did not advance"
                    )));
                }
            }
        }

        info!(network = %self.network, owner, total = objects.len(), pages, "listed owned blobs");
        Ok(objects)
    }

    /// Owned blobs as records. Objects that cannot be extracted are skipped.
    pub async fn owned_records(&self, owner: &str) -> ChainResult<Vec<BlobRecord>> {
        let objects = self.list_owned_blobs(owner).await?;
        let total = objects.len();
        let records: Vec<BlobRecord> = objects.iter().filter_map(extract_record).collect();
        if records.len() < total {
            debug!(skipped = total - records.len(), "dropped unusable blob objects");
        }
        Ok(records)
    }

    /// Total WAL balance of `owner` in native units, summed over every coin
    /// page.
    pub async fn wal_balance(&self, owner: &str) -> ChainResult<u128> {
        let mut total: u128 = 0;
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .rpc
                .get_coins(owner, &self.config.wal_coin_type, cursor.as_deref())
                .await?;
            for coin in &page.data {
                let balance: u128 = coin.balance.parse().map_err(|_| {
                    ChainError::InvalidResponse(format!("coin balance {:?}", coin.balance))
                })?;
                total = total.saturating_add(balance);
            }

            if !page.has_next_page {
                break;
            }
            match page.next_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                other => {
                    return Err(ChainError::Pagination(format!(
                        "coin listing cursor {other:?} did not advance"
                    )));
                }
            }
        }

        debug!(owner, balance = %total, "computed WAL balance");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{Coin, CoinsPage, ObjectsPage};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves a fixed list of pages and records the cursors it was asked for.
    struct PagedRpc {
        pages: Vec<ObjectsPage>,
        coins: Vec<CoinsPage>,
        seen_cursors: Mutex<Vec<Option<String>>>,
    }

    impl PagedRpc {
        fn new(pages: Vec<ObjectsPage>) -> Self {
            Self {
                pages,
                coins: Vec::new(),
                seen_cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LedgerRpc for PagedRpc {
        async fn get_owned_objects(&self, query: &OwnedObjectsQuery) -> ChainResult<ObjectsPage> {
            let mut seen = self.seen_cursors.lock().unwrap();
            let index = seen.len();
            seen.push(query.cursor.clone());
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| ChainError::InvalidResponse("no more pages".into()))
        }

        async fn get_coins(
            &self,
            _owner: &str,
            _coin_type: &str,
            cursor: Option<&str>,
        ) -> ChainResult<CoinsPage> {
            let index = cursor.map(|c| c.parse::<usize>().unwrap()).unwrap_or(0);
            Ok(self.coins[index].clone())
        }

        async fn latest_checkpoint(&self) -> ChainResult<u64> {
            Ok(1)
        }
    }

    fn object(id: &str, blob_id: &str) -> RawChainObject {
        RawChainObject(json!({
            "data": {
                "objectId": id,
                "content": { "fields": { "blob_id": blob_id, "size": "10" } },
                "owner": { "AddressOwner": "0xme" }
            }
        }))
    }

    fn page(objects: Vec<RawChainObject>, next: Option<&str>) -> ObjectsPage {
        ObjectsPage {
            data: objects,
            has_next_page: next.is_some(),
            next_cursor: next.map(str::to_string),
        }
    }

    fn query(rpc: PagedRpc) -> (Arc<PagedRpc>, ChainQuery) {
        let rpc = Arc::new(rpc);
        let query = ChainQuery::new(rpc.clone(), Network::Mainnet, ChainConfig::default());
        (rpc, query)
    }

    #[tokio::test]
    async fn follows_cursor_across_pages() {
        let (rpc, query) = query(PagedRpc::new(vec![
            page(vec![object("0x1", "1"), object("0x2", "2")], Some("cursor-a")),
            page(vec![object("0x3", "3")], None),
        ]));

        let objects = query.list_owned_blobs("0xme").await.unwrap();
        let ids: Vec<_> = objects.iter().filter_map(|o| o.object_id()).collect();
        assert_eq!(ids, vec!["0x1", "0x2", "0x3"]);
        assert_eq!(
            *rpc.seen_cursors.lock().unwrap(),
            vec![None, Some("cursor-a".to_string())]
        );
    }

    #[tokio::test]
    async fn stalled_cursor_is_an_error() {
        let (_, query) = query(PagedRpc::new(vec![
            page(vec![object("0x1", "1")], Some("same")),
            page(vec![object("0x2", "2")], Some("same")),
        ]));
        let err = query.list_owned_blobs("0xme").await.unwrap_err();
        assert!(matches!(err, ChainError::Pagination(_)));
    }

    #[tokio::test]
    async fn more_pages_without_cursor_is_an_error() {
        let broken = ObjectsPage {
            data: vec![object("0x1", "1")],
            has_next_page: true,
            next_cursor: None,
        };
        let (_, query) = query(PagedRpc::new(vec![broken]));
        assert!(query.list_owned_blobs("0xme").await.is_err());
    }

    #[tokio::test]
    async fn owned_records_skip_malformed_objects() {
        let malformed = RawChainObject(json!({ "data": { "objectId": "0xbad" } }));
        let (_, query) = query(PagedRpc::new(vec![
            page(vec![object("0x1", "255"), malformed], Some("c1")),
            page(vec![object("0x3", "16")], None),
        ]));
        let records = query.owned_records("0xme").await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.blob_id().to_string()).collect();
        assert_eq!(ids, vec!["0xff", "0x10"]);
    }

    #[tokio::test]
    async fn wal_balance_sums_all_pages() {
        let mut rpc = PagedRpc::new(Vec::new());
        let coin = |balance: &str| Coin {
            coin_object_id: None,
            balance: balance.to_string(),
        };
        rpc.coins = vec![
            CoinsPage {
                data: vec![coin("1000000000"), coin("500")],
                has_next_page: true,
                next_cursor: Some("1".into()),
            },
            CoinsPage {
                data: vec![coin("18446744073709551616")],
                has_next_page: false,
                next_cursor: None,
            },
        ];
        let (_, query) = query(rpc);
        let total = query.wal_balance("0xme").await.unwrap();
        assert_eq!(total, 1_000_000_500 + 18_446_744_073_709_551_616u128);
    }
}
