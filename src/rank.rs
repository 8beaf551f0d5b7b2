//! Score aggregation and final ranking.
//!
//! The executor flattens per-batch scores into one vector in original
//! document order; [`aggregate_scores`] turns that vector into the final
//! ranking. The function is total: a score vector that disagrees with the
//! document count (a parsing anomaly upstream) is padded or truncated, so
//! the output always has exactly one entry per input document.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Score assigned to every document of a batch that exhausted its retries.
///
/// Low enough to sink below any real relevance score, so failed batches
/// rank after everything the scorer actually judged.
pub const SENTINEL_SCORE: f64 = -100.0;

/// One document's position in the final ranking.
///
/// # Fields
///
/// - `index`: position of the document in the original input list
/// - `score`: relevance score (higher is more relevant)
/// - `rank`: 0-based position after sorting
///
/// # Example
///
/// ```ignore
/// let results = reranker.rerank_documents(query, &documents, None).await?;
/// for result in &results {
///     println!("#{} doc {} score {:.3}", result.rank, result.index, result.score);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Index of the document in the original list.
    pub index: usize,
    /// Relevance score (higher is more relevant).
    pub score: f64,
    /// 0-based rank; 0 is the most relevant document.
    pub rank: usize,
}

/// Sort scores into the final ranking.
///
/// `scores[i]` must be document `i`'s score. Ordering is score descending
/// with ties broken by ascending index, so equal scores keep their input
/// order and the result is deterministic. The returned vector is in rank
/// order and its `index` values are a permutation of `0..total`.
pub fn aggregate_scores(mut scores: Vec<f64>, total: usize) -> Vec<RankedResult> {
    if scores.len() < total {
        warn!(
            expected = total,
            got = scores.len(),
            "score count below document count, padding with 0.0"
        );
        scores.resize(total, 0.0);
    } else if scores.len() > total {
        warn!(
            expected = total,
            got = scores.len(),
            "score count above document count, truncating"
        );
        scores.truncate(total);
    }

    let mut indexed: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    indexed
        .into_iter()
        .enumerate()
        .map(|(rank, (index, score))| RankedResult { index, score, rank })
        .collect()
}
