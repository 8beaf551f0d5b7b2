//! Pipeline configuration types.
//!
//! # Architecture
//!
//! ```ascii
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       RerankConfig                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │ base_url: String            ─────► Scoring endpoint          │
//! │ model: String               ─────► Reranker model name       │
//! │ api_key: Option<String>     ─────► Bearer authentication     │
//! │ timeout: Duration           ─────► Per-request timeout       │
//! │ max_retries: u32            ─────► Attempts per batch        │
//! │ batch_size: usize           ─────► Documents per request     │
//! │ max_concurrent_requests     ─────► In-flight request cap     │
//! │ retry_base_delay: Duration  ─────► Backoff unit (doubles)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use crate::error::{RerankError, Result};

/// Configuration for a remote scoring provider.
///
/// # Provider-Specific Configurations
///
/// Use the factory methods for the two supported deployment shapes:
/// - [`RerankConfig::deepinfra`] - DeepInfra-hosted Qwen reranker
/// - [`RerankConfig::self_hosted`] - a self-hosted endpoint speaking the
///   same wire format
///
/// # Example
///
/// ```ignore
/// let config = RerankConfig::deepinfra("your-api-key")
///     .with_batch_size(20)
///     .with_max_retries(5);
/// ```
#[derive(Debug, Clone)]
pub struct RerankConfig {
    /// Base URL of the scoring endpoint. The model name is appended as a
    /// path segment unless the URL already ends with it.
    pub base_url: String,
    /// Reranker model name.
    pub model: String,
    /// API key for Bearer authentication. `None` sends no auth header.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts per batch before its documents get the sentinel score.
    pub max_retries: u32,
    /// Documents per scoring request. Zero is coerced to the default.
    pub batch_size: usize,
    /// Maximum scoring requests in flight at once.
    pub max_concurrent_requests: usize,
    /// Backoff unit: attempt `n` waits `retry_base_delay * 2^n`.
    pub retry_base_delay: Duration,
}

/// Default documents per scoring request.
pub const DEFAULT_BATCH_SIZE: usize = 10;

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepinfra.com/v1/inference".to_string(),
            model: "Qwen/Qwen3-Reranker-4B".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_requests: 5,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

impl RerankConfig {
    /// Create a DeepInfra config for the Qwen reranker.
    pub fn deepinfra(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Create a config for a self-hosted scoring endpoint.
    ///
    /// Keeps the default model name; override it with [`with_model`]
    /// when the deployment serves something else.
    ///
    /// [`with_model`]: RerankConfig::with_model
    pub fn self_hosted(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RERANK_BASE_URL`: scoring endpoint (required)
    /// - `RERANK_MODEL`: model name
    /// - `RERANK_API_KEY`: Bearer token
    /// - `RERANK_TIMEOUT_SECS`: per-request timeout in seconds
    /// - `RERANK_MAX_RETRIES`: attempts per batch
    /// - `RERANK_BATCH_SIZE`: documents per request
    /// - `RERANK_MAX_CONCURRENT_REQUESTS`: in-flight request cap
    ///
    /// # Errors
    ///
    /// Returns an error if `RERANK_BASE_URL` is not set or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("RERANK_BASE_URL").map_err(|_| {
            RerankError::Config("RERANK_BASE_URL environment variable not set".to_string())
        })?;

        let mut config = Self {
            base_url,
            ..Default::default()
        };

        if let Ok(model) = std::env::var("RERANK_MODEL") {
            config.model = model;
        }
        if let Ok(key) = std::env::var("RERANK_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Some(secs) = parse_env::<u64>("RERANK_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_env::<u32>("RERANK_MAX_RETRIES")? {
            config.max_retries = retries;
        }
        if let Some(size) = parse_env::<usize>("RERANK_BATCH_SIZE")? {
            config.batch_size = size;
        }
        if let Some(limit) = parse_env::<usize>("RERANK_MAX_CONCURRENT_REQUESTS")? {
            config.max_concurrent_requests = limit;
        }

        Ok(config)
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the attempts per batch.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the documents per scoring request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the in-flight request cap.
    pub fn with_max_concurrent_requests(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = limit;
        self
    }

    /// Set the backoff unit between retry attempts.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}

/// Configuration for the failover controller.
#[derive(Debug, Clone)]
pub struct FailoverConfig {
    /// Whether to try the secondary provider when the primary fails.
    pub enable_fallback: bool,
    /// Consecutive primary failures before a degradation warning is logged.
    pub max_primary_failures: u32,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            enable_fallback: true,
            max_primary_failures: 3,
        }
    }
}

impl FailoverConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ENABLE_RERANK_FALLBACK`: `"true"` (default) or anything else for off
    /// - `RERANK_MAX_PRIMARY_FAILURES`: warning threshold
    ///
    /// # Errors
    ///
    /// Returns an error if `RERANK_MAX_PRIMARY_FAILURES` does not parse.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("ENABLE_RERANK_FALLBACK") {
            config.enable_fallback = truthy(&raw);
        }
        if let Some(max) = parse_env::<u32>("RERANK_MAX_PRIMARY_FAILURES")? {
            config.max_primary_failures = max;
        }
        Ok(config)
    }

    /// Enable or disable the fallback provider.
    pub fn with_fallback(mut self, enable: bool) -> Self {
        self.enable_fallback = enable;
        self
    }

    /// Set the consecutive-failure warning threshold.
    pub fn with_max_primary_failures(mut self, max: u32) -> Self {
        self.max_primary_failures = max;
        self
    }
}

fn truthy(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| RerankError::Config(format!("{} has invalid value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}
