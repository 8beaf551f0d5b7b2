//! memrank - Resilient reranking for memory retrieval pipelines
//!
//! This crate reorders memory search hits by semantic relevance to a query,
//! using remote cross-encoder scoring endpoints behind a failure-isolating
//! pipeline: batched requests, bounded concurrency, per-batch retries with
//! exponential backoff, sentinel scores for unrecoverable batches, and an
//! optional primary/fallback provider pair.
//!
//! The guiding rule is that reranking never takes retrieval down with it.
//! Every failure mode short of "no provider returned anything" degrades to
//! a usable ordering instead of an error.
//!
//! # Architecture
//!
//! ```ascii
//!   memory hits ──► Reranker::rerank_memories (provided)
//!                        │ extract text per hit
//!                        ▼
//!                   rerank_documents
//!                        │
//!          ┌─────────────┼──────────────────┐
//!          ▼             ▼                  ▼
//!   FailoverReranker  RemoteReranker  TermOverlapReranker
//!   (primary, then    (batch, limit,  (local lexical
//!    secondary)        retry, score)   baseline)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use memrank::{RerankConfig, RemoteReranker, Reranker};
//!
//! let reranker = RemoteReranker::new(RerankConfig::deepinfra(api_key))?;
//! let reranked = reranker
//!     .rerank_memories("what did we decide about caching?", &hits, Some(10), None)
//!     .await;
//! ```
//!
//! # See Also
//!
//! - [`crate::traits`] for the scoring trait and hit-level orchestration
//! - [`crate::remote`] for the HTTP scoring pipeline
//! - [`crate::failover`] for the two-provider controller

pub mod batch;
pub mod config;
pub mod error;
pub mod failover;
pub mod hit;
pub mod rank;
pub mod remote;
pub mod retry;
pub mod term_overlap;
pub mod traits;

pub use batch::{partition, Batch, BatchScores};
pub use config::{FailoverConfig, RerankConfig, DEFAULT_BATCH_SIZE};
pub use error::{RerankError, Result};
pub use failover::FailoverReranker;
pub use hit::{MemoryHit, MemoryKind};
pub use rank::{aggregate_scores, RankedResult, SENTINEL_SCORE};
pub use remote::{
    RemoteReranker, DEFAULT_INSTRUCTION, SCORING_PROMPT_PREFIX, SCORING_PROMPT_SUFFIX,
};
pub use retry::RetryPolicy;
pub use term_overlap::TermOverlapReranker;
pub use traits::Reranker;
