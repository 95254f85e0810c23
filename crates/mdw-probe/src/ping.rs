use async_trait::async_trait;
use tracing::trace;

use crate::error::{ProbeError, ProbeResult};

/// Best-effort reachability check for one URL.
#[async_trait]
pub trait HttpPing: Send + Sync {
    /// Succeeds when the endpoint answered at all. The status code is
    /// returned but not judged: any response proves the route works.
    async fn ping(&self, url: &str) -> ProbeResult<u16>;
}

/// [`HttpPing`] over a plain `GET` with caching disabled.
#[derive(Clone, Debug, Default)]
pub struct ReqwestPing {
    client: reqwest::Client,
}

impl ReqwestPing {
    /// Ping through an existing HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpPing for ReqwestPing {
    async fn ping(&self, url: &str) -> ProbeResult<u16> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;
        let status = response.status().as_u16();
        trace!(url, status, "ping answered");
        Ok(status)
    }
}
