//! Reranker trait definition.
//!
//! This module defines the core `Reranker` trait that all scoring providers
//! and the failover controller satisfy.
//!
//! # Architecture
//!
//! ```ascii
//!                       ┌─────────────────┐
//!                       │  Reranker Trait │
//!                       └────────┬────────┘
//!                                │
//!         ┌──────────────────────┼──────────────────────┐
//!         │                      │                      │
//!         ▼                      ▼                      ▼
//! ┌────────────────┐   ┌─────────────────────┐  ┌──────────────────┐
//! │ RemoteReranker │   │ TermOverlapReranker │  │ FailoverReranker │
//! │ (HTTP scoring) │   │ (local, lexical)    │  │ (two providers)  │
//! └────────────────┘   └─────────────────────┘  └──────────────────┘
//! ```
//!
//! # Required Methods
//!
//! - [`name`](Reranker::name) - Identifier for the provider
//! - [`model`](Reranker::model) - Model/algorithm being used
//! - [`rerank_documents`](Reranker::rerank_documents) - Score raw documents
//!
//! # Provided Methods
//!
//! - [`rerank_memories`](Reranker::rerank_memories) - Hit-level reranking
//!   with graceful degradation; inherited by every implementor, so the
//!   failover controller gets hit-level failover for free.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::hit::MemoryHit;
use crate::rank::RankedResult;

/// Trait for reranking providers.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the model being used.
    fn model(&self) -> &str;

    /// Rerank documents based on relevance to a query.
    ///
    /// # Arguments
    ///
    /// - `query`: the search query to rank against
    /// - `documents`: documents to rerank, position is identity
    /// - `instruction`: optional relevance instruction for the scorer
    ///
    /// # Returns
    ///
    /// All documents as [`RankedResult`]s in rank order (highest score
    /// first). Implementations fail only when no score could be obtained
    /// at all; partial failures surface as sentinel scores instead.
    async fn rerank_documents(
        &self,
        query: &str,
        documents: &[String],
        instruction: Option<&str>,
    ) -> Result<Vec<RankedResult>>;

    /// Rerank retrieved memory hits.
    ///
    /// Extracts one document per hit, scores them via
    /// [`rerank_documents`](Reranker::rerank_documents), and returns clones
    /// of the hits in rank order with `score` overwritten. Never fails: if
    /// scoring errors out, the original hits are returned sorted by their
    /// pre-existing retrieval score instead.
    ///
    /// `top_k` truncates the result when positive; `None` and `Some(0)`
    /// return everything.
    async fn rerank_memories(
        &self,
        query: &str,
        hits: &[MemoryHit],
        top_k: Option<usize>,
        instruction: Option<&str>,
    ) -> Vec<MemoryHit> {
        if hits.is_empty() {
            return Vec::new();
        }

        let documents: Vec<String> = hits.iter().map(MemoryHit::rerank_text).collect();

        match self.rerank_documents(query, &documents, instruction).await {
            Ok(results) => {
                let mut reranked = Vec::with_capacity(results.len());
                for result in &results {
                    if result.index < hits.len() {
                        let mut hit = hits[result.index].clone();
                        hit.score = result.score;
                        reranked.push(hit);
                    }
                }
                let top_scores: Vec<String> = reranked
                    .iter()
                    .take(3)
                    .map(|hit| format!("{:.4}", hit.score))
                    .collect();
                info!(
                    provider = self.name(),
                    results = reranked.len(),
                    top_scores = ?top_scores,
                    "memory reranking completed"
                );
                truncate_top_k(reranked, top_k)
            }
            Err(e) => {
                warn!(
                    provider = self.name(),
                    error = %e,
                    "reranking failed, returning hits in retrieval score order"
                );
                let mut fallback = hits.to_vec();
                fallback.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                truncate_top_k(fallback, top_k)
            }
        }
    }
}

fn truncate_top_k(mut hits: Vec<MemoryHit>, top_k: Option<usize>) -> Vec<MemoryHit> {
    if let Some(k) = top_k {
        if k > 0 {
            hits.truncate(k);
        }
    }
    hits
}
