//! Failover controller wrapping two scoring providers.
//!
//! # Architecture
//!
//! ```ascii
//!                ┌──────────────────────────┐
//!   rerank ────► │     FailoverReranker     │
//!                │                          │
//!                │  1. try primary ─────────┼──► primary provider
//!                │     ok? reset counter    │    (self-hosted, cheap)
//!                │                          │
//!                │  2. on failure:          │
//!                │     count += 1, warn     │
//!                │     fallback enabled? ───┼──► secondary provider
//!                │                          │    (hosted, reliable)
//!                │  3. both failed: error   │
//!                └──────────────────────────┘
//! ```
//!
//! Routing is decided per call: the primary is always tried first, no
//! matter how often it failed before. The consecutive-failure counter is
//! a health signal (reset on primary success, never by fallback success);
//! crossing the configured threshold logs a degradation warning without
//! changing routing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::{FailoverConfig, RerankConfig};
use crate::error::{RerankError, Result};
use crate::rank::RankedResult;
use crate::remote::RemoteReranker;
use crate::traits::Reranker;

/// Two-provider reranker with automatic failover.
///
/// Implements [`Reranker`], so hit-level calls inherit the provided
/// `rerank_memories` and degrade to retrieval-score order only when both
/// providers fail.
///
/// # Example
///
/// ```ignore
/// let primary = Arc::new(RemoteReranker::new(RerankConfig::self_hosted(url))?);
/// let secondary = Arc::new(RemoteReranker::deepinfra("api-key")?);
/// let reranker = FailoverReranker::new(primary, secondary, FailoverConfig::default());
///
/// let reranked = reranker.rerank_memories(query, &hits, Some(10), None).await;
/// ```
pub struct FailoverReranker {
    primary: Arc<dyn Reranker>,
    secondary: Arc<dyn Reranker>,
    config: FailoverConfig,
    consecutive_failures: AtomicU32,
}

impl FailoverReranker {
    /// Create a controller over explicit providers.
    pub fn new(
        primary: Arc<dyn Reranker>,
        secondary: Arc<dyn Reranker>,
        config: FailoverConfig,
    ) -> Self {
        info!(
            primary = primary.name(),
            secondary = secondary.name(),
            fallback_enabled = config.enable_fallback,
            max_failures = config.max_primary_failures,
            "initialized failover reranker"
        );
        Self {
            primary,
            secondary,
            config,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Build the standard deployment from environment variables: a
    /// self-hosted primary (`RERANK_*`) with a DeepInfra secondary
    /// (`DEEPINFRA_API_KEY`) and [`FailoverConfig::from_env`] behavior.
    pub fn from_env() -> Result<Self> {
        let primary = RemoteReranker::new(RerankConfig::from_env()?)?;
        let secondary_config = match std::env::var("DEEPINFRA_API_KEY") {
            Ok(key) if !key.is_empty() => RerankConfig::deepinfra(key),
            _ => RerankConfig::default(),
        };
        let secondary = RemoteReranker::new(secondary_config)?;
        Ok(Self::new(
            Arc::new(primary),
            Arc::new(secondary),
            FailoverConfig::from_env()?,
        ))
    }

    /// Consecutive primary failures since the last primary success.
    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Reset the failure counter, e.g. after a health check recovery.
    pub fn reset_failure_count(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        info!("reset primary rerank failure count to 0");
    }

    /// Whether the secondary provider is consulted on primary failure.
    pub fn fallback_enabled(&self) -> bool {
        self.config.enable_fallback
    }
}

#[async_trait]
impl Reranker for FailoverReranker {
    fn name(&self) -> &str {
        "failover"
    }

    fn model(&self) -> &str {
        self.primary.model()
    }

    async fn rerank_documents(
        &self,
        query: &str,
        documents: &[String],
        instruction: Option<&str>,
    ) -> Result<Vec<RankedResult>> {
        match self
            .primary
            .rerank_documents(query, documents, instruction)
            .await
        {
            Ok(results) => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
                Ok(results)
            }
            Err(primary_error) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(
                    provider = self.primary.name(),
                    count = failures,
                    error = %primary_error,
                    "primary rerank provider failed"
                );

                if !self.config.enable_fallback {
                    error!("fallback disabled, surfacing primary error");
                    return Err(RerankError::FallbackDisabled {
                        primary: primary_error.to_string(),
                    });
                }

                if failures >= self.config.max_primary_failures {
                    warn!(
                        max_failures = self.config.max_primary_failures,
                        "primary rerank provider exceeded max consecutive failures"
                    );
                }

                info!(
                    provider = self.secondary.name(),
                    "falling back to secondary rerank provider"
                );
                match self
                    .secondary
                    .rerank_documents(query, documents, instruction)
                    .await
                {
                    Ok(results) => Ok(results),
                    Err(fallback_error) => {
                        error!(error = %fallback_error, "fallback rerank provider also failed");
                        Err(RerankError::BothProvidersFailed {
                            primary: primary_error.to_string(),
                            fallback: fallback_error.to_string(),
                        })
                    }
                }
            }
        }
    }
}
