use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A named URL to probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// How the ledger endpoints are tried.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerProbeMode {
    /// One at a time in order, stopping at the first success.
    #[default]
    Sequential,
    /// All at once; any success passes.
    Concurrent,
}

/// Connectivity probe configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub generic_endpoints: Vec<Endpoint>,
    /// Per-request budget for generic endpoints, in milliseconds.
    pub request_timeout_ms: u64,
    /// Average latency above which a reachable network is reported as slow.
    pub slow_threshold_ms: u64,
    pub ledger_endpoints: Vec<Endpoint>,
    /// Per-endpoint budget for the checkpoint call, in milliseconds.
    pub ledger_timeout_ms: u64,
    pub ledger_mode: LedgerProbeMode,
}

impl ProbeConfig {
    /// Budget for one generic endpoint.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Budget for one ledger checkpoint call.
    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            generic_endpoints: vec![
                Endpoint::new("httpbin", "https://httpbin.org/get"),
                Endpoint::new("Google DNS", "https://8.8.8.8/resolve?name=google.com"),
                Endpoint::new("Cloudflare", "https://1.1.1.1/dns-query?name=cloudflare.com"),
            ],
            request_timeout_ms: 5_000,
            slow_threshold_ms: 3_000,
            ledger_endpoints: vec![
                Endpoint::new("Sui Mainnet RPC", "https://sui-mainnet.blockvision.org"),
                Endpoint::new("Sui Mainnet Fullnode", "https://fullnode.mainnet.sui.io"),
                Endpoint::new(
                    "Sui Mainnet Alternative",
                    "https://sui-mainnet-rpc.allthatnode.com",
                ),
            ],
            ledger_timeout_ms: 10_000,
            ledger_mode: LedgerProbeMode::Sequential,
        }
    }
}
