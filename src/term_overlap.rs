//! Term overlap reranker implementation.
//!
//! A simple, fast scorer using Jaccard-like term overlap.
//!
//! # When to Use
//!
//! - Testing and development (no scoring endpoint required)
//! - A never-failing secondary for [`FailoverReranker`]
//!
//! # Limitations
//!
//! - No IDF weighting (rare terms not prioritized)
//! - No term frequency consideration
//! - Ignores the relevance instruction
//!
//! [`FailoverReranker`]: crate::failover::FailoverReranker

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::rank::{aggregate_scores, RankedResult};
use crate::traits::Reranker;

/// Local reranker using simple Jaccard-like term overlap.
///
/// # Algorithm
///
/// ```ascii
/// Query Terms:  {capital, of, france}
///                      │
///                      ▼
/// Document:     "The capital of France is Paris"
///                      │
///                      ▼
/// Doc Terms:    {the, capital, of, france, is, paris}
///                      │
///                      ▼
/// Score = |query ∩ doc| / |query| = 3/3 = 1.0
/// ```
pub struct TermOverlapReranker {
    model: String,
}

impl TermOverlapReranker {
    /// Create a new term overlap reranker.
    pub fn new() -> Self {
        Self {
            model: "term-overlap-reranker".to_string(),
        }
    }
}

impl Default for TermOverlapReranker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reranker for TermOverlapReranker {
    fn name(&self) -> &str {
        "term-overlap"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn rerank_documents(
        &self,
        query: &str,
        documents: &[String],
        _instruction: Option<&str>,
    ) -> Result<Vec<RankedResult>> {
        let query_lower = query.to_lowercase();
        let query_terms: HashSet<&str> = query_lower.split_whitespace().collect();
        let max_terms = query_terms.len().max(1);

        let scores: Vec<f64> = documents
            .iter()
            .map(|doc| {
                let doc_lower = doc.to_lowercase();
                let doc_terms: HashSet<&str> = doc_lower.split_whitespace().collect();
                let overlap = query_terms.intersection(&doc_terms).count();
                overlap as f64 / max_terms as f64
            })
            .collect();

        Ok(aggregate_scores(scores, documents.len()))
    }
}
