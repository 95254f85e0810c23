use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use mdw_chain::{JsonRpcClient, LedgerRpc};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::{Endpoint, LedgerProbeMode, ProbeConfig};
use crate::error::{ProbeError, ProbeResult};
use crate::ping::{HttpPing, ReqwestPing};
use crate::report::{NetworkReport, ProbeReport};

/// A ledger node to probe, with the client used to reach it.
#[derive(Clone)]
pub struct LedgerEndpoint {
    pub name: String,
    pub rpc: Arc<dyn LedgerRpc>,
}

impl LedgerEndpoint {
    /// Name a ledger RPC client for reports.
    pub fn new(name: impl Into<String>, rpc: Arc<dyn LedgerRpc>) -> Self {
        Self {
            name: name.into(),
            rpc,
        }
    }
}

/// Runs the pre-save connectivity checks.
pub struct NetworkProbe {
    config: ProbeConfig,
    ping: Arc<dyn HttpPing>,
    ledgers: Vec<LedgerEndpoint>,
}

struct Attempt<'a> {
    name: &'a str,
    outcome: ProbeResult<()>,
    elapsed: Duration,
}

async fn attempt<'a, F, T>(name: &'a str, budget: Duration, fut: F) -> Attempt<'a>
where
    F: Future<Output = ProbeResult<T>>,
{
    let started = Instant::now();
    let outcome = match timeout(budget, fut).await {
        Ok(result) => result.map(|_| ()),
        Err(_) => Err(ProbeError::Timeout(budget)),
    };
    Attempt {
        name,
        outcome,
        elapsed: started.elapsed(),
    }
}

async fn probe_ledger(ep: &LedgerEndpoint, budget: Duration) -> Attempt<'_> {
    attempt(&ep.name, budget, async {
        ep.rpc.latest_checkpoint().await.map_err(ProbeError::from)
    })
    .await
}

fn join_failures(attempts: &[Attempt<'_>]) -> String {
    attempts
        .iter()
        .filter_map(|a| a.outcome.as_ref().err().map(|e| format!("{}: {e}", a.name)))
        .collect::<Vec<_>>()
        .join("; ")
}

impl NetworkProbe {
    /// Build a probe with real HTTP and JSON-RPC clients for every configured
    /// endpoint.
    pub fn from_config(config: ProbeConfig) -> ProbeResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ProbeError::Config(e.to_string()))?;
        let ledgers = config
            .ledger_endpoints
            .iter()
            .map(|Endpoint { name, url }| {
                let rpc = JsonRpcClient::with_http(http.clone(), url.clone());
                LedgerEndpoint::new(name.clone(), Arc::new(rpc))
            })
            .collect();
        Ok(Self::new(config, Arc::new(ReqwestPing::new(http)), ledgers))
    }

    /// Build a probe from explicit collaborators.
    pub fn new(config: ProbeConfig, ping: Arc<dyn HttpPing>, ledgers: Vec<LedgerEndpoint>) -> Self {
        Self {
            config,
            ping,
            ledgers,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Ping every generic endpoint in parallel.
    ///
    /// Passes when at least one answers. A mean latency over the slow
    /// threshold still passes, with the latency noted in the details.
    pub async fn check_generic_connectivity(&self) -> ProbeReport {
        let endpoints = &self.config.generic_endpoints;
        if endpoints.is_empty() {
            return ProbeReport::down("no connectivity endpoints configured");
        }

        let budget = self.config.request_timeout();
        let attempts = join_all(
            endpoints
                .iter()
                .map(|ep| attempt(&ep.name, budget, self.ping.ping(&ep.url))),
        )
        .await;

        let latencies: Vec<Duration> = attempts
            .iter()
            .filter(|a| a.outcome.is_ok())
            .map(|a| a.elapsed)
            .collect();

        if latencies.is_empty() {
            let details = format!("all connectivity checks failed: {}", join_failures(&attempts));
            warn!(details = %details, "generic connectivity down");
            return ProbeReport::down(details);
        }

        let average_ms = latencies.iter().map(|d| d.as_millis()).sum::<u128>() / latencies.len() as u128;
        debug!(
            reachable = latencies.len(),
            total = attempts.len(),
            average_ms = average_ms as u64,
            "generic connectivity checked"
        );

        if average_ms > u128::from(self.config.slow_threshold_ms) {
            ProbeReport::slow(format!(
                "network reachable but slow, average response time {average_ms}ms"
            ))
        } else {
            ProbeReport::good(format!("average response time {average_ms}ms"))
        }
    }

    /// Ask the ledger nodes for their latest checkpoint.
    pub async fn check_ledger_connectivity(&self) -> ProbeReport {
        if self.ledgers.is_empty() {
            return ProbeReport::down("no ledger endpoints configured");
        }

        let budget = self.config.ledger_timeout();

        let attempts = match self.config.ledger_mode {
            LedgerProbeMode::Sequential => {
                let mut attempts = Vec::with_capacity(self.ledgers.len());
                for ep in &self.ledgers {
                    let a = probe_ledger(ep, budget).await;
                    let done = a.outcome.is_ok();
                    attempts.push(a);
                    if done {
                        break;
                    }
                }
                attempts
            }
            LedgerProbeMode::Concurrent => {
                join_all(self.ledgers.iter().map(|ep| probe_ledger(ep, budget))).await
            }
        };

        match attempts.iter().find(|a| a.outcome.is_ok()) {
            Some(a) => {
                info!(endpoint = a.name, elapsed_ms = a.elapsed.as_millis() as u64, "ledger reachable");
                ProbeReport::good(format!("{}, response time {}ms", a.name, a.elapsed.as_millis()))
            }
            None => {
                let details = format!("all ledger RPC endpoints unreachable: {}", join_failures(&attempts));
                warn!(details = %details, "ledger connectivity down");
                ProbeReport::down(details)
            }
        }
    }

    /// Both checks, run concurrently.
    pub async fn check_all(&self) -> NetworkReport {
        let (generic, ledger) = tokio::join!(
            self.check_generic_connectivity(),
            self.check_ledger_connectivity()
        );
        NetworkReport { generic, ledger }
    }
}

impl std::fmt::Debug for NetworkProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkProbe")
            .field("config", &self.config)
            .field("ledgers", &self.ledgers.iter().map(|l| &l.name).collect::<Vec<_>>())
            .finish()
    }
}
