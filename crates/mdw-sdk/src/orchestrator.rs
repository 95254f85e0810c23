use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use mdw_cache::LocalCache;
use mdw_types::{BlobRecord, Network, SaveStage, SaveState};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::classify::{classify, to_save_failure};
use crate::config::SaveConfig;
use crate::error::{FailureKind, SaveFailure, SdkError};
use crate::file::MarkdownFile;
use crate::flow::{AttemptError, CertifiedSession, FreshSession};
use crate::lifecycle::ClientLifecycle;
use crate::ports::{ConnectivityGate, RegisterParams, StorageClient, TransactionDigest, WalletSigner};
use crate::retry::RetryPolicy;

/// Progress shown while the connectivity check runs.
const NETWORK_CHECK_PROGRESS: u8 = 5;

/// A successful save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SaveReceipt {
    pub save_id: Uuid,
    pub blob_id: String,
    pub register_digest: TransactionDigest,
    pub certify_digest: TransactionDigest,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Drives one document at a time through the storage write protocol.
///
/// Progress is published as [`SaveState`] on a watch channel. Only one save
/// runs at a time; a second call while one is in flight is rejected.
pub struct SaveOrchestrator {
    network: Network,
    config: SaveConfig,
    retry: RetryPolicy,
    wallet: Arc<dyn WalletSigner>,
    lifecycle: Arc<ClientLifecycle>,
    gate: Arc<dyn ConnectivityGate>,
    cache: Arc<LocalCache>,
    state: watch::Sender<SaveState>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the save returns, whichever way.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SaveOrchestrator {
    /// Create an idle orchestrator.
    pub fn new(
        network: Network,
        config: SaveConfig,
        wallet: Arc<dyn WalletSigner>,
        lifecycle: Arc<ClientLifecycle>,
        gate: Arc<dyn ConnectivityGate>,
        cache: Arc<LocalCache>,
    ) -> Self {
        let (state, _) = watch::channel(SaveState::idle());
        Self {
            network,
            retry: RetryPolicy::from_config(&config),
            config,
            wallet,
            lifecycle,
            gate,
            cache,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Current state.
    pub fn state(&self) -> SaveState {
        self.state.borrow().clone()
    }

    /// Watch every published state change.
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.state.subscribe()
    }

    /// Whether a save is in flight.
    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Reset the published state to idle. An in-flight save keeps running
    /// and will publish again at its next step.
    pub fn dismiss(&self) {
        self.publish(SaveState::idle());
    }

    /// Save `content` as a new blob.
    ///
    /// `filename` defaults to the configured name. On success the record is
    /// written through to the local cache.
    pub async fn save(&self, content: &str, filename: Option<&str>) -> Result<SaveReceipt, SaveFailure> {
        let _in_flight = InFlight::acquire(&self.in_flight).ok_or_else(|| {
            SaveFailure::new(FailureKind::SaveInProgress, "A save is already in progress")
        })?;

        let owner = self
            .wallet
            .current_address()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                SaveFailure::new(FailureKind::WalletNotConnected, "Connect a wallet before saving")
            })?;

        let client = self.lifecycle.get(self.network).await.map_err(|e| {
            let message = match e {
                SdkError::ClientInit { message, .. } => message,
                other => other.to_string(),
            };
            SaveFailure::new(FailureKind::ClientNotReady, message)
        })?;

        let filename = filename
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.config.default_filename);
        let save_id = Uuid::now_v7();
        info!(%save_id, network = %self.network, filename, bytes = content.len(), "save started");

        self.publish(SaveState::active(
            SaveStage::Encoding,
            NETWORK_CHECK_PROGRESS,
            "Checking network connection...",
        ));
        let report = self.gate.check().await;
        if let Some(details) = report.failure() {
            let failure = SaveFailure::new(FailureKind::Connectivity, details);
            error!(%save_id, details, "connectivity check failed, nothing was submitted");
            self.publish(SaveState::failed(failure.message.clone()));
            return Err(failure);
        }
        debug!(%save_id, generic = %report.generic.verdict, ledger = %report.ledger.verdict, "connectivity ok");

        let mut attempt = 1;
        let certified = loop {
            match self
                .run_attempt(client.as_ref(), content, filename, &owner, attempt)
                .await
            {
                Ok(certified) => break certified,
                Err(err) => {
                    let class = classify(&err.failure);
                    if self.retry.should_retry(attempt, class) {
                        let delay = self.retry.backoff(attempt);
                        warn!(
                            %save_id,
                            attempt,
                            stage = %err.stage,
                            error = %err.failure,
                            delay_ms = delay.as_millis() as u64,
                            "network error, retrying"
                        );
                        self.publish(SaveState::active(
                            err.stage,
                            0,
                            format!(
                                "Network error, retrying in {}s (attempt {}/{})",
                                delay.as_secs_f64(),
                                attempt + 1,
                                self.retry.max_attempts
                            ),
                        ));
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let failure = to_save_failure(&err.failure, self.network);
                    error!(
                        %save_id,
                        attempt,
                        stage = %err.stage,
                        kind = ?failure.kind,
                        error = %err.failure,
                        "save failed"
                    );
                    self.publish(SaveState::failed(failure.message.clone()));
                    return Err(failure);
                }
            }
        };

        // Both transactions are executed at this point; a failure here is
        // final so nothing gets signed twice.
        let outcome = match certified.finish().await {
            Ok(outcome) => outcome,
            Err(err) => {
                let failure = SaveFailure::new(
                    FailureKind::Other,
                    format!("Save failed: {}", err.failure),
                );
                error!(
                    %save_id,
                    attempt,
                    error = %err.failure,
                    "blob certified but written files could not be read"
                );
                self.publish(SaveState::failed(failure.message.clone()));
                return Err(failure);
            }
        };

        match BlobRecord::for_saved_document(&outcome.blob_id, filename, content, &owner) {
            Some(record) => {
                if let Err(e) = self.cache.upsert(record) {
                    warn!(%save_id, blob_id = %outcome.blob_id, error = %e, "saved blob not cached");
                }
            }
            None => warn!(%save_id, "saved blob has no usable identifier, not cached"),
        }

        info!(%save_id, blob_id = %outcome.blob_id, attempts = attempt, "save completed");
        self.publish(SaveState::completed(outcome.blob_id.clone()));

        Ok(SaveReceipt {
            save_id,
            blob_id: outcome.blob_id,
            register_digest: outcome.register_digest,
            certify_digest: outcome.certify_digest,
            attempts: attempt,
        })
    }

    /// One pass through encode, register, upload, certify with a fresh flow.
    /// Reading the written files is left to the caller, outside the retry.
    async fn run_attempt(
        &self,
        client: &dyn StorageClient,
        content: &str,
        filename: &str,
        owner: &str,
        attempt: u32,
    ) -> Result<CertifiedSession, AttemptError> {
        self.enter(SaveStage::Encoding, attempt);
        let file = MarkdownFile::from_markdown(content, filename, &self.config.app_tag, Utc::now());
        let encoded = FreshSession::new(client.write_flow(file)).encode().await?;

        self.enter(SaveStage::Registering, attempt);
        let params = RegisterParams {
            epochs: self.config.epochs,
            owner: owner.to_string(),
            deletable: self.config.deletable,
        };
        let registered = encoded.register(&params, self.wallet.as_ref()).await?;

        self.enter(SaveStage::Uploading, attempt);
        let uploaded = registered.upload(self.config.upload_timeout()).await?;

        self.enter(SaveStage::Certifying, attempt);
        uploaded.certify(self.wallet.as_ref()).await
    }

    fn enter(&self, stage: SaveStage, attempt: u32) {
        let message = if attempt > 1 {
            format!(
                "{} (attempt {attempt}/{})",
                stage.status_message(),
                self.retry.max_attempts
            )
        } else {
            stage.status_message().to_string()
        };
        debug!(%stage, attempt, "entering stage");
        self.publish(SaveState::active(stage, stage.entry_progress(), message));
    }

    fn publish(&self, state: SaveState) {
        self.state.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LifecycleConfig;
    use crate::error::ExternalError;
    use crate::ports::{ClientFactory, Transaction, TransactionKind, WriteFlow, WrittenFile};
    use async_trait::async_trait;
    use mdw_cache::InMemoryKvStore;
    use mdw_probe::{NetworkReport, ProbeReport};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    // -----------------------------------------------------------------------
    // Scripted collaborators
    // -----------------------------------------------------------------------

    #[derive(Clone, Default)]
    enum Upload {
        #[default]
        Ok,
        Fail(&'static str),
        Hang(Duration),
    }

    /// Behaviour of one write flow.
    #[derive(Clone, Default)]
    struct Script {
        encode_error: Option<&'static str>,
        register_rejection: Option<&'static str>,
        upload: Upload,
        list_error: Option<&'static str>,
    }

    #[derive(Default)]
    struct Observed {
        /// (step, stage, progress) at the moment each step ran.
        steps: Vec<(&'static str, SaveStage, u8)>,
        states: Vec<SaveState>,
    }

    struct ScriptedFlow {
        script: Script,
        observed: Arc<Mutex<Observed>>,
        state: Option<watch::Receiver<SaveState>>,
    }

    impl ScriptedFlow {
        fn note(&self, step: &'static str) {
            if let Some(rx) = &self.state {
                let state = rx.borrow().clone();
                let mut observed = self.observed.lock().unwrap();
                observed.steps.push((step, state.stage(), state.progress()));
                observed.states.push(state);
            }
        }
    }

    #[async_trait]
    impl WriteFlow for ScriptedFlow {
        async fn encode(&mut self) -> Result<(), ExternalError> {
            self.note("encode");
            match self.script.encode_error {
                Some(msg) => Err(msg.into()),
                None => Ok(()),
            }
        }

        fn register(&mut self, params: &RegisterParams) -> Result<Transaction, ExternalError> {
            self.note("register");
            Ok(Transaction::new(
                TransactionKind::Register,
                json!({ "epochs": params.epochs, "owner": params.owner, "reject": self.script.register_rejection }),
            ))
        }

        async fn upload(&mut self, _digest: &TransactionDigest) -> Result<(), ExternalError> {
            self.note("upload");
            match self.script.upload.clone() {
                Upload::Ok => Ok(()),
                Upload::Fail(msg) => Err(msg.into()),
                Upload::Hang(d) => {
                    tokio::time::sleep(d).await;
                    Ok(())
                }
            }
        }

        fn certify(&mut self) -> Result<Transaction, ExternalError> {
            self.note("certify");
            Ok(Transaction::new(TransactionKind::Certify, json!({})))
        }

        async fn list_files(&mut self) -> Result<Vec<WrittenFile>, ExternalError> {
            if let Some(msg) = self.script.list_error {
                return Err(msg.into());
            }
            Ok(vec![WrittenFile {
                blob_id: "Bx8Kq2mN4pR7sT1vW3yZ5aC6dE9fG0hJ2kL4mN6pQ8r".into(),
            }])
        }
    }

    #[derive(Default)]
    struct ScriptedStorage {
        scripts: Mutex<VecDeque<Script>>,
        flows: AtomicU32,
        observed: Arc<Mutex<Observed>>,
        state: Mutex<Option<watch::Receiver<SaveState>>>,
    }

    #[async_trait]
    impl StorageClient for ScriptedStorage {
        fn write_flow(&self, _file: MarkdownFile) -> Box<dyn WriteFlow> {
            self.flows.fetch_add(1, Ordering::SeqCst);
            let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
            Box::new(ScriptedFlow {
                script,
                observed: self.observed.clone(),
                state: self.state.lock().unwrap().clone(),
            })
        }

        async fn read_blob(&self, _blob_id: &str) -> Result<Vec<u8>, ExternalError> {
            Ok(b"# stored".to_vec())
        }
    }

    struct Factory {
        storage: Arc<ScriptedStorage>,
        broken: bool,
    }

    #[async_trait]
    impl ClientFactory for Factory {
        async fn load_runtime(&self) -> Result<(), ExternalError> {
            if self.broken {
                Err("WebAssembly is not available".into())
            } else {
                Ok(())
            }
        }

        async fn create(&self, _network: Network) -> Result<Arc<dyn StorageClient>, ExternalError> {
            Ok(self.storage.clone())
        }
    }

    struct Wallet {
        address: Option<String>,
        signed: Mutex<Vec<TransactionKind>>,
    }

    #[async_trait]
    impl WalletSigner for Wallet {
        fn current_address(&self) -> Option<String> {
            self.address.clone()
        }

        async fn sign_and_execute(&self, tx: Transaction) -> Result<TransactionDigest, ExternalError> {
            self.signed.lock().unwrap().push(tx.kind);
            if let Some(reason) = tx.payload.get("reject").and_then(|v| v.as_str()) {
                return Err(reason.into());
            }
            Ok(match tx.kind {
                TransactionKind::Register => "reg-digest".into(),
                TransactionKind::Certify => "cert-digest".into(),
            })
        }
    }

    struct Gate(NetworkReport);

    #[async_trait]
    impl ConnectivityGate for Gate {
        async fn check(&self) -> NetworkReport {
            self.0.clone()
        }
    }

    fn healthy() -> NetworkReport {
        NetworkReport {
            generic: ProbeReport::good("average response time 80ms"),
            ledger: ProbeReport::good("Sui Mainnet Fullnode, response time 120ms"),
        }
    }

    struct Harness {
        orchestrator: SaveOrchestrator,
        storage: Arc<ScriptedStorage>,
        wallet: Arc<Wallet>,
        cache: Arc<LocalCache>,
    }

    struct Setup {
        scripts: Vec<Script>,
        address: Option<&'static str>,
        broken_runtime: bool,
        network: NetworkReport,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                scripts: Vec::new(),
                address: Some("0xme"),
                broken_runtime: false,
                network: healthy(),
            }
        }
    }

    fn harness(setup: Setup) -> Harness {
        let storage = Arc::new(ScriptedStorage {
            scripts: Mutex::new(setup.scripts.into()),
            ..Default::default()
        });
        let lifecycle = Arc::new(ClientLifecycle::new(
            Arc::new(Factory {
                storage: storage.clone(),
                broken: setup.broken_runtime,
            }),
            LifecycleConfig {
                load_attempts: 2,
                load_delay_ms: 10,
            },
        ));
        let wallet = Arc::new(Wallet {
            address: setup.address.map(str::to_string),
            signed: Mutex::new(Vec::new()),
        });
        let cache = Arc::new(LocalCache::new(Arc::new(InMemoryKvStore::new())));
        let orchestrator = SaveOrchestrator::new(
            Network::Mainnet,
            SaveConfig::default(),
            wallet.clone(),
            lifecycle,
            Arc::new(Gate(setup.network)),
            cache.clone(),
        );
        *storage.state.lock().unwrap() = Some(orchestrator.subscribe());
        Harness {
            orchestrator,
            storage,
            wallet,
            cache,
        }
    }

    fn upload_fails(msg: &'static str) -> Script {
        Script {
            upload: Upload::Fail(msg),
            ..Default::default()
        }
    }

    fn holds_invariant(state: &SaveState) -> bool {
        match state.stage() {
            SaveStage::Completed => state.blob_id().is_some() && state.error().is_none(),
            SaveStage::Error => state.error().is_some() && state.blob_id().is_none(),
            _ => state.blob_id().is_none() && state.error().is_none(),
        }
    }

    // -----------------------------------------------------------------------
    // Happy path
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn save_walks_every_stage_in_order() {
        let h = harness(Setup::default());
        let receipt = h.orchestrator.save("# Notes\n\nhello", Some("notes.md")).await.unwrap();

        assert_eq!(receipt.attempts, 1);
        assert_eq!(receipt.register_digest.0, "reg-digest");
        assert_eq!(receipt.certify_digest.0, "cert-digest");

        let observed = h.storage.observed.lock().unwrap();
        assert_eq!(
            observed.steps,
            vec![
                ("encode", SaveStage::Encoding, 10),
                ("register", SaveStage::Registering, 25),
                ("upload", SaveStage::Uploading, 50),
                ("certify", SaveStage::Certifying, 75),
            ]
        );
        assert!(observed.states.iter().all(holds_invariant));

        let state = h.orchestrator.state();
        assert_eq!(state.stage(), SaveStage::Completed);
        assert_eq!(state.progress(), 100);
        assert_eq!(state.blob_id(), Some(receipt.blob_id.as_str()));
        assert!(holds_invariant(&state));
        assert!(!h.orchestrator.is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn success_writes_through_to_cache() {
        let h = harness(Setup::default());
        let receipt = h.orchestrator.save("# Notes", None).await.unwrap();

        let cached = h.cache.get(&receipt.blob_id).unwrap();
        assert_eq!(cached.filename, "document.md");
        assert_eq!(cached.owner, "0xme");
        assert_eq!(cached.content.as_deref(), Some("# Notes"));
        assert_eq!(cached.size_bytes, 7);
    }

    // -----------------------------------------------------------------------
    // Retry and classification
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn three_network_failures_exhaust_retries() {
        let h = harness(Setup {
            scripts: vec![
                upload_fails("Too many failures while writing blob"),
                upload_fails("network error"),
                upload_fails("connection reset"),
                Script::default(),
            ],
            ..Default::default()
        });

        let started = Instant::now();
        let failure = h.orchestrator.save("# doc", None).await.unwrap_err();

        assert_eq!(h.storage.flows.load(Ordering::SeqCst), 3);
        assert_eq!(failure.kind, FailureKind::NetworkExhausted);
        assert_eq!(failure.message, crate::classify::NETWORK_EXHAUSTED_MESSAGE);
        // 1s then 2s of backoff.
        assert_eq!(started.elapsed(), Duration::from_secs(3));

        let state = h.orchestrator.state();
        assert_eq!(state.stage(), SaveStage::Error);
        assert_eq!(state.error(), Some(failure.message.as_str()));
        assert!(h.cache.list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_restarts_from_encode_and_can_succeed() {
        let h = harness(Setup {
            scripts: vec![upload_fails("fetch failed"), Script::default()],
            ..Default::default()
        });
        let receipt = h.orchestrator.save("# doc", None).await.unwrap();
        assert_eq!(receipt.attempts, 2);

        let observed = h.storage.observed.lock().unwrap();
        let steps: Vec<_> = observed.steps.iter().map(|(s, _, _)| *s).collect();
        assert_eq!(
            steps,
            vec!["encode", "register", "upload", "encode", "register", "upload", "certify"]
        );
        let second_encode = observed.states[3].message().to_string();
        assert_eq!(second_encode, "Encoding file... (attempt 2/3)");
    }

    #[tokio::test(start_paused = true)]
    async fn balance_error_is_not_retried() {
        let h = harness(Setup {
            scripts: vec![Script {
                register_rejection: Some(
                    "Not enough coins... WAL ... requested balance 5000000000",
                ),
                ..Default::default()
            }],
            ..Default::default()
        });

        let failure = h.orchestrator.save("# doc", None).await.unwrap_err();
        assert_eq!(h.storage.flows.load(Ordering::SeqCst), 1);
        assert_eq!(failure.kind, FailureKind::InsufficientBalance);
        assert_eq!(failure.required_wal, Some(5));
        assert_eq!(failure.message, "Insufficient WAL balance, need: 5 WAL");
        assert!(failure.guidance.is_some());
        assert_eq!(h.orchestrator.state().stage(), SaveStage::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn unclassified_error_is_prefixed_and_final() {
        let h = harness(Setup {
            scripts: vec![Script {
                encode_error: Some("encoder panicked"),
                ..Default::default()
            }],
            ..Default::default()
        });
        let failure = h.orchestrator.save("# doc", None).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Other);
        assert_eq!(failure.message, "Save failed: encoder panicked");
        assert_eq!(h.storage.flows.load(Ordering::SeqCst), 1);
        assert!(h.wallet.signed.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn upload_timeout_never_reaches_certify() {
        let hang = Script {
            upload: Upload::Hang(Duration::from_secs(45)),
            ..Default::default()
        };
        let h = harness(Setup {
            scripts: vec![hang.clone(), hang.clone(), hang],
            ..Default::default()
        });

        let failure = h.orchestrator.save("# doc", None).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::UploadTimeout);
        assert_eq!(failure.message, crate::classify::UPLOAD_TIMEOUT_MESSAGE);
        assert_eq!(h.storage.flows.load(Ordering::SeqCst), 3);

        let signed = h.wallet.signed.lock().unwrap();
        assert!(signed.iter().all(|k| *k == TransactionKind::Register));
        let observed = h.storage.observed.lock().unwrap();
        assert!(observed.steps.iter().all(|(s, _, _)| *s != "certify"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_after_certify_is_not_retried() {
        let h = harness(Setup {
            scripts: vec![
                Script {
                    list_error: Some("fetch failed"),
                    ..Default::default()
                },
                Script::default(),
            ],
            ..Default::default()
        });

        let failure = h.orchestrator.save("# doc", None).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Other);
        assert_eq!(failure.message, "Save failed: fetch failed");
        assert_eq!(h.storage.flows.load(Ordering::SeqCst), 1);
        assert_eq!(
            *h.wallet.signed.lock().unwrap(),
            vec![TransactionKind::Register, TransactionKind::Certify]
        );
        assert_eq!(h.orchestrator.state().stage(), SaveStage::Error);
        assert!(h.cache.list().is_empty());
    }

    // -----------------------------------------------------------------------
    // Preconditions and gating
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn no_wallet_is_rejected_without_entering_a_stage() {
        let h = harness(Setup {
            address: None,
            ..Default::default()
        });
        let failure = h.orchestrator.save("# doc", None).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::WalletNotConnected);
        assert!(failure.kind.is_precondition());
        assert_eq!(h.orchestrator.state(), SaveState::idle());
        assert_eq!(h.storage.flows.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn client_init_error_is_surfaced_verbatim() {
        let h = harness(Setup {
            broken_runtime: true,
            ..Default::default()
        });
        let failure = h.orchestrator.save("# doc", None).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::ClientNotReady);
        assert_eq!(failure.message, "WebAssembly is not available");
        assert_eq!(h.orchestrator.state(), SaveState::idle());
    }

    #[tokio::test(start_paused = true)]
    async fn connectivity_failure_aborts_before_any_step() {
        let h = harness(Setup {
            network: NetworkReport {
                generic: ProbeReport::good("average response time 80ms"),
                ledger: ProbeReport::down("all ledger RPC endpoints unreachable: node: timed out"),
            },
            ..Default::default()
        });
        let failure = h.orchestrator.save("# doc", None).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Connectivity);
        assert_eq!(
            failure.message,
            "all ledger RPC endpoints unreachable: node: timed out"
        );
        assert_eq!(h.storage.flows.load(Ordering::SeqCst), 0);
        assert!(h.wallet.signed.lock().unwrap().is_empty());
        assert_eq!(h.orchestrator.state().stage(), SaveStage::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn second_save_while_running_is_rejected() {
        let h = harness(Setup {
            scripts: vec![Script {
                upload: Upload::Hang(Duration::from_secs(5)),
                ..Default::default()
            }],
            ..Default::default()
        });

        let (first, second) = tokio::join!(
            h.orchestrator.save("# one", None),
            h.orchestrator.save("# two", None)
        );
        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().kind, FailureKind::SaveInProgress);
        assert_eq!(h.storage.flows.load(Ordering::SeqCst), 1);
        assert!(!h.orchestrator.is_saving());
    }

    // -----------------------------------------------------------------------
    // Presentation
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn dismiss_resets_to_idle() {
        let h = harness(Setup::default());
        let mut rx = h.orchestrator.subscribe();
        h.orchestrator.save("# doc", None).await.unwrap();
        assert_eq!(rx.borrow_and_update().stage(), SaveStage::Completed);

        h.orchestrator.dismiss();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SaveState::idle());
    }
}
