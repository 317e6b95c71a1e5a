use serde::{Deserialize, Serialize};

/// Connection settings for the metadata/media provider.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Root under which both the `/api/v1` and `/proxy` surfaces live.
    pub base_url: String,
    /// Bearer credential. When absent, requests go out unauthenticated.
    pub token: Option<String>,
    /// Try the proxy play path before the direct v1 path.
    pub prefer_proxy: bool,
    pub request_timeout_secs: u64,
    /// Attempts per path (not per resolution).
    pub retry_attempts: u32,
    /// Linear backoff base; the n-th retry waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sapimu.au/shortmax".to_string(),
            token: None,
            prefer_proxy: true,
            request_timeout_secs: 15,
            retry_attempts: 2,
            retry_backoff_ms: 350,
        }
    }
}
