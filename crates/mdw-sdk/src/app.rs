use std::sync::Arc;
use std::time::Duration;

use mdw_cache::LocalCache;
use mdw_chain::{ChainQuery, JsonRpcClient, LedgerRpc};
use mdw_probe::NetworkProbe;
use mdw_types::{BlobRecord, Network, SaveState};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::SdkConfig;
use crate::error::{SaveFailure, SdkResult};
use crate::library::BlobLibrary;
use crate::lifecycle::ClientLifecycle;
use crate::orchestrator::{SaveOrchestrator, SaveReceipt};
use crate::ports::{ClientFactory, ConnectivityGate, WalletSigner};

/// Everything an embedding application needs, wired for one network.
pub struct Md2Walrus {
    config: SdkConfig,
    wallet: Arc<dyn WalletSigner>,
    lifecycle: Arc<ClientLifecycle>,
    orchestrator: SaveOrchestrator,
    library: BlobLibrary,
}

impl Md2Walrus {
    /// Build from configuration, talking to the network's public fullnode and
    /// the configured probe endpoints.
    pub fn from_config(
        mut config: SdkConfig,
        wallet: Arc<dyn WalletSigner>,
        factory: Arc<dyn ClientFactory>,
    ) -> SdkResult<Self> {
        config.apply_network_defaults();
        config.validate()?;
        let rpc = ledger_client(&config)?;
        let probe = NetworkProbe::from_config(config.probe.clone())?;
        Ok(Self::from_parts(config, wallet, factory, Arc::new(rpc), Arc::new(probe)))
    }

    /// Build with explicit ledger and connectivity collaborators.
    pub fn from_parts(
        config: SdkConfig,
        wallet: Arc<dyn WalletSigner>,
        factory: Arc<dyn ClientFactory>,
        rpc: Arc<dyn LedgerRpc>,
        gate: Arc<dyn ConnectivityGate>,
    ) -> Self {
        let network = config.network;
        let cache = Arc::new(LocalCache::with_key(
            config.cache.open_store(),
            config.cache.storage_key.clone(),
        ));
        let lifecycle = Arc::new(ClientLifecycle::new(factory, config.lifecycle.clone()));
        let orchestrator = SaveOrchestrator::new(
            network,
            config.save.clone(),
            wallet.clone(),
            lifecycle.clone(),
            gate,
            cache.clone(),
        );
        let query = ChainQuery::new(rpc, network, config.chain.clone());
        let library = BlobLibrary::new(query, cache, lifecycle.clone());
        info!(%network, "md2walrus ready");

        Self {
            config,
            wallet,
            lifecycle,
            orchestrator,
            library,
        }
    }

    /// Network this instance talks to.
    pub fn network(&self) -> Network {
        self.config.network
    }

    /// Configuration after network defaults were applied.
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// The save orchestrator.
    pub fn orchestrator(&self) -> &SaveOrchestrator {
        &self.orchestrator
    }

    /// The blob library.
    pub fn library(&self) -> &BlobLibrary {
        &self.library
    }

    /// Shared storage client lifecycle.
    pub fn lifecycle(&self) -> &Arc<ClientLifecycle> {
        &self.lifecycle
    }

    // ---- Saving ----

    /// Save a document. See [`SaveOrchestrator::save`].
    pub async fn save(&self, content: &str, filename: Option<&str>) -> Result<SaveReceipt, SaveFailure> {
        self.orchestrator.save(content, filename).await
    }

    /// Latest published save state.
    pub fn save_state(&self) -> SaveState {
        self.orchestrator.state()
    }

    /// Watch save state changes.
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.orchestrator.subscribe()
    }

    /// Reset the save state to idle.
    pub fn dismiss(&self) {
        self.orchestrator.dismiss()
    }

    // ---- Library ----

    /// Refresh the connected account's documents. Without a connected wallet
    /// this returns whatever is cached.
    pub async fn my_blobs(&self) -> SdkResult<Vec<BlobRecord>> {
        match self.wallet.current_address() {
            Some(owner) => self.library.refresh(&owner).await,
            None => {
                debug!("no wallet connected, listing cached records");
                Ok(self.library.cached())
            }
        }
    }

    /// WAL balance of the connected account, `None` without a wallet.
    pub async fn wal_balance(&self) -> SdkResult<Option<u128>> {
        match self.wallet.current_address() {
            Some(owner) => Ok(Some(self.library.wal_balance(&owner).await?)),
            None => Ok(None),
        }
    }

    /// Text of a stored blob, `None` on any failure.
    pub async fn read_content(&self, blob_id: &str) -> Option<String> {
        self.library.read_content(blob_id).await
    }

    /// Explorer link for a record on this network.
    pub fn explorer_url(&self, record: &BlobRecord) -> String {
        record.explorer_url(self.config.network)
    }
}

fn ledger_client(config: &SdkConfig) -> SdkResult<JsonRpcClient> {
    Ok(JsonRpcClient::new(
        config.network.fullnode_url(),
        Duration::from_millis(config.chain.request_timeout_ms),
    )?)
}
