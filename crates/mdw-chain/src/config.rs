use serde::{Deserialize, Serialize};

/// Move type of storage blob objects on mainnet.
pub const MAINNET_BLOB_STRUCT_TYPE: &str =
    "0xfdc88f7d7cf30afab2f82e8380d11ee8f70efb90e863d1de8616fae1bb09ea77::blob::Blob";

/// Coin type of the WAL token on mainnet.
pub const MAINNET_WAL_COIN_TYPE: &str =
    "0x8270feb7375eee355e64fdb69c50abb6b5f9393a722883c1cf45f8e26048810a::wal::WAL";

/// Ledger query configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Struct type filter for owned blob objects.
    pub blob_struct_type: String,
    /// Coin type summed by balance checks.
    pub wal_coin_type: String,
    /// Page size requested per call; `None` lets the node decide.
    pub page_size: Option<u32>,
    /// Per-request timeout for the JSON-RPC client, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            blob_struct_type: MAINNET_BLOB_STRUCT_TYPE.to_string(),
            wal_coin_type: MAINNET_WAL_COIN_TYPE.to_string(),
            page_size: None,
            request_timeout_ms: 15_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ChainConfig::default();
        assert!(c.blob_struct_type.ends_with("::blob::Blob"));
        assert!(c.wal_coin_type.ends_with("::wal::WAL"));
        assert!(c.page_size.is_none());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let c: ChainConfig = serde_json::from_str(r#"{"page_size": 25}"#).unwrap();
        assert_eq!(c.page_size, Some(25));
        assert_eq!(c.wal_coin_type, MAINNET_WAL_COIN_TYPE);
    }
}
