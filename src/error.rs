//! Rerank error types and retry classification.
//!
//! # Error Handling Philosophy
//!
//! Errors should be:
//! 1. **Contained**: a single failing batch must never abort a whole rerank
//! 2. **Specific**: carry the HTTP status, batch offset, or provider message
//! 3. **Classified**: transient errors retry, permanent ones fail fast
//!
//! # Common Errors
//!
//! | Error | Cause | Handling |
//! |-------|-------|----------|
//! | `Network` | Connection refused/reset | Retried with backoff |
//! | `Timeout` | Scoring endpoint too slow | Retried with backoff |
//! | `Api` | Non-2xx from the endpoint | Retried with backoff |
//! | `InvalidResponse` | Unparseable/short body | Retried with backoff |
//! | `RetriesExhausted` | One batch spent its budget | Sentinel scores |
//! | `AllBatchesFailed` | Endpoint down for every batch | Degraded hit order |
//! | `BothProvidersFailed` | Primary and fallback both down | Surfaced to caller |

use thiserror::Error;

/// Result type for rerank operations.
pub type Result<T> = std::result::Result<T, RerankError>;

/// Errors that can occur while reranking.
#[derive(Debug, Error)]
pub enum RerankError {
    /// Transport-level failure talking to the scoring endpoint.
    #[error("Network error: {0}")]
    Network(String),

    /// The scoring request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Non-2xx response from the scoring endpoint.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The endpoint answered 2xx but the body was not a usable score set.
    #[error("Invalid scoring response: {0}")]
    InvalidResponse(String),

    /// A single batch used its whole retry budget.
    #[error("Batch at offset {start_index} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        start_index: usize,
        attempts: u32,
        #[source]
        source: Box<RerankError>,
    },

    /// Every batch of a rerank call failed; no score was obtained at all.
    #[error("All {batches} scoring batches failed, last error: {last}")]
    AllBatchesFailed { batches: usize, last: String },

    /// The primary provider failed and fallback is disabled.
    #[error("Primary rerank provider failed and fallback is disabled: {primary}")]
    FallbackDisabled { primary: String },

    /// Both the primary and the fallback provider failed.
    #[error("Both rerank providers failed. Primary: {primary}. Fallback: {fallback}")]
    BothProvidersFailed { primary: String, fallback: String },

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RerankError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RerankError::Timeout
        } else if err.is_connect() {
            RerankError::Network(format!("Connection failed: {}", err))
        } else {
            RerankError::Network(err.to_string())
        }
    }
}

impl RerankError {
    /// Whether the per-batch retry loop should try this error again.
    ///
    /// Transient transport and protocol failures are retryable; everything
    /// that already aggregates failures (exhausted batches, provider-level
    /// errors) or reflects bad configuration is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::Api { .. } | Self::InvalidResponse(_)
        )
    }
}
