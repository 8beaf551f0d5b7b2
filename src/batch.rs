//! Batch partitioning for scoring requests.
//!
//! Large document sets are split into fixed-size batches so each scoring
//! request stays bounded. Batches borrow from the caller's document vector
//! and remember where they start, which is all the executor needs to stitch
//! per-batch scores back into one vector in original document order.

use crate::config::DEFAULT_BATCH_SIZE;

/// One scoring request's worth of documents.
///
/// # Fields
///
/// - `start_index`: offset of `documents[0]` in the original input
/// - `documents`: contiguous slice of the input, at most `batch_size` long
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// Offset of the first document in the original input.
    pub start_index: usize,
    /// The batch's documents, in input order.
    pub documents: &'a [String],
}

/// Scores for one batch, in the batch's document order.
#[derive(Debug, Clone, Default)]
pub struct BatchScores {
    /// One relevance score per batch document.
    pub scores: Vec<f64>,
    /// Prompt tokens the provider reported for this request, when any.
    pub input_tokens: u64,
    /// Provider-assigned request id, when any.
    pub request_id: Option<String>,
}

/// Split documents into batches of `batch_size`, preserving order.
///
/// The batches cover the input without gaps or overlap; only the last batch
/// may be short. A zero `batch_size` is coerced to the default rather than
/// rejected.
pub fn partition(documents: &[String], batch_size: usize) -> Vec<Batch<'_>> {
    let batch_size = if batch_size == 0 {
        DEFAULT_BATCH_SIZE
    } else {
        batch_size
    };
    documents
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            start_index: i * batch_size,
            documents: chunk,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("doc {}", i)).collect()
    }

    #[test]
    fn test_partition_splits_25_into_10_10_5() {
        let documents = docs(25);
        let batches = partition(&documents, 10);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].start_index, 0);
        assert_eq!(batches[0].documents.len(), 10);
        assert_eq!(batches[1].start_index, 10);
        assert_eq!(batches[1].documents.len(), 10);
        assert_eq!(batches[2].start_index, 20);
        assert_eq!(batches[2].documents.len(), 5);
    }

    #[test]
    fn test_partition_is_a_lossless_cover() {
        let documents = docs(23);
        let batches = partition(&documents, 7);
        let mut rebuilt = Vec::new();
        for batch in &batches {
            assert_eq!(batch.start_index, rebuilt.len());
            rebuilt.extend_from_slice(batch.documents);
        }
        assert_eq!(rebuilt, documents);
    }

    #[test]
    fn test_partition_exact_multiple() {
        let documents = docs(20);
        let batches = partition(&documents, 10);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].documents.len(), 10);
    }

    #[test]
    fn test_partition_single_short_batch() {
        let documents = docs(3);
        let batches = partition(&documents, 10);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].start_index, 0);
        assert_eq!(batches[0].documents.len(), 3);
    }

    #[test]
    fn test_partition_empty_input() {
        let documents: Vec<String> = Vec::new();
        assert!(partition(&documents, 10).is_empty());
    }

    #[test]
    fn test_partition_zero_batch_size_uses_default() {
        let documents = docs(25);
        let batches = partition(&documents, 0);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].documents.len(), DEFAULT_BATCH_SIZE);
    }
}
