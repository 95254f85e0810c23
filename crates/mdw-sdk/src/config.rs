use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mdw_cache::{FileKvStore, InMemoryKvStore, KeyValueStore, DEFAULT_STORAGE_KEY};
use mdw_chain::config::{MAINNET_BLOB_STRUCT_TYPE, MAINNET_WAL_COIN_TYPE};
use mdw_chain::ChainConfig;
use mdw_probe::{Endpoint, ProbeConfig};
use mdw_types::Network;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Parameters of a single save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Retention in storage epochs.
    pub epochs: u32,
    pub deletable: bool,
    pub upload_timeout_ms: u64,
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub default_filename: String,
    /// Value of the `app` tag attached to every stored file.
    pub app_tag: String,
}

impl SaveConfig {
    /// Budget for the upload step.
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            epochs: 5,
            deletable: true,
            upload_timeout_ms: 30_000,
            max_attempts: 3,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 5_000,
            default_filename: "document.md".into(),
            app_tag: "md2walrus".into(),
        }
    }
}

/// Storage client initialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Attempts at loading the client runtime before giving up.
    pub load_attempts: u32,
    /// Fixed delay between load attempts.
    pub load_delay_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            load_attempts: 5,
            load_delay_ms: 1_000,
        }
    }
}

/// Where the local record cache lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub storage_key: String,
    /// Directory for the file-backed store. `None` keeps records in memory.
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Open the configured key-value backend.
    pub fn open_store(&self) -> Arc<dyn KeyValueStore> {
        match &self.dir {
            Some(dir) => Arc::new(FileKvStore::open(dir.clone())),
            None => Arc::new(InMemoryKvStore::new()),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.into(),
            dir: None,
        }
    }
}

/// Top-level SDK configuration.
///
/// Every section is optional in TOML; missing keys take their defaults.
///
/// ```toml
/// network = "mainnet"
///
/// [save]
/// epochs = 10
///
/// [probe]
/// ledger_mode = "concurrent"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    pub network: Network,
    pub save: SaveConfig,
    pub probe: ProbeConfig,
    pub chain: ChainConfig,
    pub lifecycle: LifecycleConfig,
    pub cache: CacheConfig,
}

impl SdkConfig {
    /// Parse TOML, apply network defaults and validate.
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        let mut config: Self = toml::from_str(s)?;
        config.apply_network_defaults();
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Replace the stock mainnet ledger probe endpoints with the configured
    /// network's fullnode. Endpoints set explicitly are left alone.
    pub fn apply_network_defaults(&mut self) {
        if self.network == Network::Mainnet
            || self.probe.ledger_endpoints != ProbeConfig::default().ledger_endpoints
        {
            return;
        }
        let name = match self.network {
            Network::Mainnet => "Sui Mainnet Fullnode",
            Network::Testnet => "Sui Testnet Fullnode",
        };
        self.probe.ledger_endpoints = vec![Endpoint::new(name, self.network.fullnode_url())];
    }

    /// Reject settings that cannot work together.
    ///
    /// Off mainnet, the blob struct type and WAL coin type must be given
    /// explicitly since the defaults only exist on mainnet.
    pub fn validate(&self) -> SdkResult<()> {
        if self.network != Network::Mainnet
            && (self.chain.blob_struct_type == MAINNET_BLOB_STRUCT_TYPE
                || self.chain.wal_coin_type == MAINNET_WAL_COIN_TYPE)
        {
            return Err(SdkError::Config(format!(
                "chain.blob_struct_type and chain.wal_coin_type must be set for {}",
                self.network
            )));
        }
        if self.save.max_attempts == 0 {
            return Err(SdkError::Config("save.max_attempts must be at least 1".into()));
        }
        if self.lifecycle.load_attempts == 0 {
            return Err(SdkError::Config("lifecycle.load_attempts must be at least 1".into()));
        }
        if self.save.backoff_cap_ms < self.save.backoff_base_ms {
            return Err(SdkError::Config(
                "save.backoff_cap_ms must not be below save.backoff_base_ms".into(),
            ));
        }
        Ok(())
    }
}
