use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mdw_types::Network;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::LifecycleConfig;
use crate::error::{SdkError, SdkResult};
use crate::ports::{ClientFactory, StorageClient};

/// Lazily initialized, shared storage clients, one per network.
///
/// The first [`Self::get`] for a network loads the client runtime and builds
/// the client while holding the lock, so concurrent first callers wait for
/// that one initialization instead of starting their own. A failed
/// initialization caches nothing; the next call starts over.
pub struct ClientLifecycle {
    factory: Arc<dyn ClientFactory>,
    config: LifecycleConfig,
    clients: Mutex<HashMap<Network, Arc<dyn StorageClient>>>,
}

impl ClientLifecycle {
    /// Lifecycle with no clients yet.
    pub fn new(factory: Arc<dyn ClientFactory>, config: LifecycleConfig) -> Self {
        Self {
            factory,
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// The client for `network`, initializing it on first use.
    ///
    /// Concurrent callers wait for the same initialization. A failure is
    /// returned to every waiter and not cached.
    pub async fn get(&self, network: Network) -> SdkResult<Arc<dyn StorageClient>> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(&network) {
            return Ok(client.clone());
        }

        info!(%network, "initializing storage client");
        match self.initialize(network).await {
            Ok(client) => {
                clients.insert(network, client.clone());
                info!(%network, "storage client ready");
                Ok(client)
            }
            Err(e) => {
                warn!(%network, error = %e, "storage client initialization failed");
                Err(e)
            }
        }
    }

    /// The client for `network` if it is already initialized.
    pub async fn cached(&self, network: Network) -> Option<Arc<dyn StorageClient>> {
        self.clients.lock().await.get(&network).cloned()
    }

    /// Drop every initialized client.
    pub async fn reset(&self) {
        self.clients.lock().await.clear();
        debug!("storage clients reset");
    }

    async fn initialize(&self, network: Network) -> SdkResult<Arc<dyn StorageClient>> {
        let attempts = self.config.load_attempts.max(1);
        let delay = Duration::from_millis(self.config.load_delay_ms);

        for attempt in 1..=attempts {
            match self.factory.load_runtime().await {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    debug!(attempt, attempts, error = %e, "client runtime not ready, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(SdkError::ClientInit {
                        attempts,
                        message: e.message,
                    })
                }
            }
        }

        self.factory
            .create(network)
            .await
            .map_err(|e| SdkError::ClientInit {
                attempts: 1,
                message: e.message,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExternalError;
    use crate::file::MarkdownFile;
    use crate::ports::WriteFlow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct NullClient;

    #[async_trait]
    impl StorageClient for NullClient {
        fn write_flow(&self, _file: MarkdownFile) -> Box<dyn WriteFlow> {
            unimplemented!("not used")
        }

        async fn read_blob(&self, _blob_id: &str) -> Result<Vec<u8>, ExternalError> {
            Ok(Vec::new())
        }
    }

    /// Runtime becomes loadable after `load_failures` failed probes; `create`
    /// fails while `create_failures` remain.
    #[derive(Default)]
    struct CountingFactory {
        load_failures: AtomicU32,
        create_failures: AtomicU32,
        loads: AtomicU32,
        creates: AtomicU32,
    }

    #[async_trait]
    impl ClientFactory for CountingFactory {
        async fn load_runtime(&self) -> Result<(), ExternalError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            let remaining = self.load_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.load_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(ExternalError::new("runtime module not loaded"));
            }
            Ok(())
        }

        async fn create(&self, _network: Network) -> Result<Arc<dyn StorageClient>, ExternalError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            let remaining = self.create_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.create_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(ExternalError::new("client constructor threw"));
            }
            Ok(Arc::new(NullClient))
        }
    }

    fn lifecycle(factory: Arc<CountingFactory>) -> ClientLifecycle {
        ClientLifecycle::new(factory, LifecycleConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_first_use_initializes_once() {
        let factory = Arc::new(CountingFactory::default());
        let lifecycle = lifecycle(factory.clone());

        let (a, b, c) = tokio::join!(
            lifecycle.get(Network::Mainnet),
            lifecycle.get(Network::Mainnet),
            lifecycle.get(Network::Mainnet)
        );
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
        assert_eq!(factory.creates.load(Ordering::SeqCst), 1);
        assert_eq!(factory.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn networks_get_separate_clients() {
        let factory = Arc::new(CountingFactory::default());
        let lifecycle = lifecycle(factory.clone());
        lifecycle.get(Network::Mainnet).await.unwrap();
        lifecycle.get(Network::Testnet).await.unwrap();
        assert_eq!(factory.creates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn load_is_retried_with_fixed_delay() {
        let factory = Arc::new(CountingFactory {
            load_failures: AtomicU32::new(3),
            ..Default::default()
        });
        let lifecycle = lifecycle(factory.clone());

        let started = tokio::time::Instant::now();
        lifecycle.get(Network::Mainnet).await.unwrap();
        assert_eq!(factory.loads.load(Ordering::SeqCst), 4);
        // Four 50ms probes plus three 1s delays.
        assert_eq!(started.elapsed(), Duration::from_millis(3_200));
    }

    #[tokio::test(start_paused = true)]
    async fn load_exhaustion_reports_attempts() {
        let factory = Arc::new(CountingFactory {
            load_failures: AtomicU32::new(10),
            ..Default::default()
        });
        let lifecycle = lifecycle(factory.clone());

        match lifecycle.get(Network::Mainnet).await {
            Err(SdkError::ClientInit { attempts, message }) => {
                assert_eq!(attempts, 5);
                assert_eq!(message, "runtime module not loaded");
            }
            other => panic!("unexpected {:?}", other.err()),
        }
        assert_eq!(factory.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_not_cached() {
        let factory = Arc::new(CountingFactory {
            create_failures: AtomicU32::new(1),
            ..Default::default()
        });
        let lifecycle = lifecycle(factory.clone());

        assert!(lifecycle.get(Network::Mainnet).await.is_err());
        assert!(lifecycle.cached(Network::Mainnet).await.is_none());
        assert!(lifecycle.get(Network::Mainnet).await.is_ok());
        assert_eq!(factory.creates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_forces_reinitialization() {
        let factory = Arc::new(CountingFactory::default());
        let lifecycle = lifecycle(factory.clone());
        lifecycle.get(Network::Mainnet).await.unwrap();
        lifecycle.reset().await;
        assert!(lifecycle.cached(Network::Mainnet).await.is_none());
        lifecycle.get(Network::Mainnet).await.unwrap();
        assert_eq!(factory.creates.load(Ordering::SeqCst), 2);
    }
}
