use thiserror::Error;

/// Failure talking to the provider. `Status` and `Network` may be retried
/// per the policy in [`super::retry`]; the rest are terminal for a request.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// The play payload parsed fine but carried no usable variant URL.
    #[error("no playable variant in upstream response")]
    NoVariants,
}

impl UpstreamError {
    /// Connection-level trouble and throttling/server errors are worth a
    /// retry; other 4xx and malformed bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed(_) | Self::NoVariants => false,
        }
    }

    /// Terminal HTTP status, when there is one, for logging.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
