use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::{ChainError, ChainResult};
use crate::rpc::{CoinsPage, LedgerRpc, ObjectsPage, OwnedObjectsQuery};

/// [`LedgerRpc`] over HTTP JSON-RPC 2.0.
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

impl JsonRpcClient {
    /// Client for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> ChainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Transport(format!("building http client: {e}")))?;
        Ok(Self::with_http(http, url))
    }

    /// Reuse an existing HTTP client.
    pub fn with_http(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC call and decode its `result`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> ChainResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(url = %self.url, method, id, "json-rpc request");

        let response = self.http.post(&self.url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Http {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body: Value = response.json().await?;
        let result = decode_envelope(body)?;
        debug!(method, id, "json-rpc call succeeded");
        serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(format!("{method}: {e}")))
    }
}

/// Pull `result` out of a response envelope, turning an `error` member into
/// [`ChainError::Rpc`].
pub fn decode_envelope(body: Value) -> ChainResult<Value> {
    let envelope: Envelope = serde_json::from_value(body)
        .map_err(|e| ChainError::InvalidResponse(format!("malformed envelope: {e}")))?;
    if let Some(error) = envelope.error {
        return Err(ChainError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    envelope
        .result
        .ok_or_else(|| ChainError::InvalidResponse("envelope has neither result nor error".into()))
}

#[async_trait]
impl LedgerRpc for JsonRpcClient {
    async fn get_owned_objects(&self, query: &OwnedObjectsQuery) -> ChainResult<ObjectsPage> {
        let params = json!([
            query.owner,
            {
                "filter": { "StructType": query.struct_type },
                "options": {
                    "showContent": true,
                    "showDisplay": true,
                    "showOwner": true,
                    "showType": true
                }
            },
            query.cursor,
            query.limit,
        ]);
        self.call("suix_getOwnedObjects", params).await
    }

    async fn get_coins(
        &self,
        owner: &str,
        coin_type: &str,
        cursor: Option<&str>,
    ) -> ChainResult<CoinsPage> {
        self.call("suix_getCoins", json!([owner, coin_type, cursor, Value::Null]))
            .await
    }

    async fn latest_checkpoint(&self) -> ChainResult<u64> {
        let raw: Value = self
            .call("sui_getLatestCheckpointSequenceNumber", json!([]))
            .await?;
        match &raw {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
        .ok_or_else(|| ChainError::InvalidResponse(format!("checkpoint sequence {raw}")))
    }
}

impl std::fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient").field("url", &self.url).finish()
    }
}
