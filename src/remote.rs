//! HTTP scoring provider with batching, concurrency capping, and retry.
//!
//! # Architecture
//!
//! ```ascii
//! ┌────────────────────────────────────────────┐
//! │               RemoteReranker               │
//! │                                            │
//! │  documents ──► partition ──► batch futures │
//! │                               │ │ │        │
//! │              Semaphore(5) ──► │ │ │        │      ┌──────────────────┐
//! │                               ▼ ▼ ▼        │ POST │ Scoring endpoint │
//! │              retry ×3, backoff 1s·2ⁿ ──────┼─────►│ (Qwen reranker)  │
//! │                               │ │ │        │◄─────│                  │
//! │  ranking ◄── aggregate ◄── scores/sentinel │ JSON └──────────────────┘
//! └────────────────────────────────────────────┘
//! ```
//!
//! # Wire Format
//!
//! Requests wrap the query and each document in the Qwen reranker judge
//! prompt and POST `{"queries": [query], "documents": [docs...]}` to
//! `{base_url}/{model}`. Responses come in two shapes, both accepted:
//!
//! ```json
//! {"results": [{"index": 0, "relevance_score": 0.93}, ...], "usage": {...}}
//! {"scores": [0.93, 0.12, ...]}
//! ```
//!
//! Batches that fail every retry attempt are scored with
//! [`SENTINEL_SCORE`]; the call itself fails only when no batch succeeded.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::batch::{partition, Batch, BatchScores};
use crate::config::RerankConfig;
use crate::error::{RerankError, Result};
use crate::rank::{aggregate_scores, RankedResult, SENTINEL_SCORE};
use crate::retry::RetryPolicy;
use crate::traits::Reranker;

/// System prompt wrapped around every scoring request.
pub const SCORING_PROMPT_PREFIX: &str = "<|im_start|>system\nJudge whether the Document meets the requirements based on the Query and the Instruct provided. Note that the answer can only be \"yes\" or \"no\".<|im_end|>\n<|im_start|>user\n";

/// Assistant turn appended after every document.
pub const SCORING_PROMPT_SUFFIX: &str =
    "<|im_end|>\n<|im_start|>assistant\n<think>\n\n</think>\n\n";

/// Relevance instruction used when the caller does not supply one.
pub const DEFAULT_INSTRUCTION: &str = "Given a question and a passage, determine if the passage contains information relevant to answering the question.";

fn format_query(query: &str, instruction: Option<&str>) -> String {
    let instruction = instruction.unwrap_or(DEFAULT_INSTRUCTION);
    format!(
        "{}<Instruct>: {}\n<Query>: {}\n",
        SCORING_PROMPT_PREFIX, instruction, query
    )
}

fn format_document(document: &str) -> String {
    format!("<Document>: {}{}", document, SCORING_PROMPT_SUFFIX)
}

#[derive(Debug, Serialize)]
struct ScoreRequest {
    queries: Vec<String>,
    documents: Vec<String>,
}

/// Per-document score entry in the indexed response shape.
#[derive(Debug, Deserialize)]
struct IndexedScore {
    index: usize,
    relevance_score: f64,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    #[serde(default)]
    prompt_tokens: u64,
}

/// The two response shapes the scoring endpoint is known to produce.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoreResponse {
    Indexed {
        results: Vec<IndexedScore>,
        #[serde(default)]
        usage: Option<TokenUsage>,
        #[serde(default)]
        id: Option<String>,
    },
    Flat {
        scores: Vec<f64>,
        #[serde(default)]
        usage: Option<TokenUsage>,
        #[serde(default)]
        id: Option<String>,
    },
}

impl ScoreResponse {
    /// Normalize either shape into scores in batch document order.
    fn into_batch_scores(self) -> BatchScores {
        match self {
            ScoreResponse::Indexed {
                mut results,
                usage,
                id,
            } => {
                results.sort_by_key(|entry| entry.index);
                BatchScores {
                    scores: results.into_iter().map(|e| e.relevance_score).collect(),
                    input_tokens: usage.map(|u| u.prompt_tokens).unwrap_or(0),
                    request_id: id,
                }
            }
            ScoreResponse::Flat { scores, usage, id } => BatchScores {
                scores,
                input_tokens: usage.map(|u| u.prompt_tokens).unwrap_or(0),
                request_id: id,
            },
        }
    }
}

/// HTTP-based scoring provider.
///
/// # Example
///
/// ```ignore
/// let reranker = RemoteReranker::deepinfra("api-key")?;
/// let ranking = reranker.rerank_documents("query", &documents, None).await?;
/// ```
pub struct RemoteReranker {
    client: Client,
    config: RerankConfig,
    limiter: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl RemoteReranker {
    /// Create a new remote reranker with the given config.
    pub fn new(config: RerankConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RerankError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));
        let retry = RetryPolicy::new(config.max_retries.max(1), config.retry_base_delay);

        Ok(Self {
            client,
            config,
            limiter,
            retry,
        })
    }

    /// Create a DeepInfra-backed reranker.
    pub fn deepinfra(api_key: impl Into<String>) -> Result<Self> {
        Self::new(RerankConfig::deepinfra(api_key))
    }

    /// Create a reranker from `RERANK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(RerankConfig::from_env()?)
    }

    /// The config this reranker was built with.
    pub fn config(&self) -> &RerankConfig {
        &self.config
    }

    /// Endpoint URL: the model name is a path segment unless the base URL
    /// already ends with it.
    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with(&self.config.model) {
            base.to_string()
        } else {
            format!("{}/{}", base, self.config.model)
        }
    }

    /// Score one batch, holding a concurrency permit across all attempts.
    async fn score_batch(
        &self,
        query: &str,
        batch: &Batch<'_>,
        instruction: Option<&str>,
    ) -> Result<BatchScores> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .expect("concurrency limiter closed");

        self.retry
            .run(|| self.send_scoring_request(query, batch.documents, instruction))
            .await
            .map_err(|e| RerankError::RetriesExhausted {
                start_index: batch.start_index,
                attempts: self.retry.max_attempts,
                source: Box::new(e),
            })
    }

    async fn send_scoring_request(
        &self,
        query: &str,
        documents: &[String],
        instruction: Option<&str>,
    ) -> Result<BatchScores> {
        let payload = ScoreRequest {
            queries: vec![format_query(query, instruction)],
            documents: documents.iter().map(|doc| format_document(doc)).collect(),
        };

        debug!(
            "Scoring request: {} documents, model: {}",
            documents.len(),
            self.config.model
        );

        let mut request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(RerankError::Api { status, message });
        }

        let parsed: ScoreResponse = response.json().await.map_err(|e| {
            RerankError::InvalidResponse(format!("Failed to parse scoring response: {}", e))
        })?;

        let batch_scores = parsed.into_batch_scores();
        if batch_scores.scores.len() != documents.len() {
            return Err(RerankError::InvalidResponse(format!(
                "Expected {} scores, got {}",
                documents.len(),
                batch_scores.scores.len()
            )));
        }

        Ok(batch_scores)
    }
}

#[async_trait]
impl Reranker for RemoteReranker {
    fn name(&self) -> &str {
        if self.config.base_url.contains("deepinfra.com") {
            "deepinfra"
        } else {
            "remote"
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn rerank_documents(
        &self,
        query: &str,
        documents: &[String],
        instruction: Option<&str>,
    ) -> Result<Vec<RankedResult>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let batches = partition(documents, self.config.batch_size);
        debug!(
            "Reranking {} documents in {} batches of up to {}",
            documents.len(),
            batches.len(),
            self.config.batch_size
        );

        let calls = batches
            .iter()
            .map(|batch| self.score_batch(query, batch, instruction));
        let outcomes = future::join_all(calls).await;

        let mut scores: Vec<f64> = Vec::with_capacity(documents.len());
        let mut input_tokens: u64 = 0;
        let mut request_id: Option<String> = None;
        let mut failed_batches = 0usize;
        let mut last_error: Option<RerankError> = None;

        for (batch, outcome) in batches.iter().zip(outcomes) {
            match outcome {
                Ok(batch_scores) => {
                    scores.extend(batch_scores.scores);
                    input_tokens += batch_scores.input_tokens;
                    request_id = batch_scores.request_id;
                }
                Err(e) => {
                    warn!(
                        start_index = batch.start_index,
                        size = batch.documents.len(),
                        error = %e,
                        "batch failed, assigning sentinel scores"
                    );
                    scores.extend(std::iter::repeat(SENTINEL_SCORE).take(batch.documents.len()));
                    failed_batches += 1;
                    last_error = Some(e);
                }
            }
        }

        if failed_batches == batches.len() {
            let last = last_error.map(|e| e.to_string()).unwrap_or_default();
            return Err(RerankError::AllBatchesFailed {
                batches: batches.len(),
                last,
            });
        }

        debug!(
            input_tokens,
            request_id = request_id.as_deref().unwrap_or("none"),
            failed_batches,
            "scoring round complete"
        );

        Ok(aggregate_scores(scores, documents.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_query_default_instruction() {
        let formatted = format_query("what changed", None);
        let expected = format!(
            "{}<Instruct>: {}\n<Query>: what changed\n",
            SCORING_PROMPT_PREFIX, DEFAULT_INSTRUCTION
        );
        assert_eq!(formatted, expected);
    }

    #[test]
    fn test_format_query_custom_instruction() {
        let formatted = format_query("q", Some("judge harshly"));
        assert!(formatted.contains("<Instruct>: judge harshly\n"));
        assert!(formatted.contains("<Query>: q\n"));
        assert!(!formatted.contains(DEFAULT_INSTRUCTION));
    }

    #[test]
    fn test_format_document_wraps_with_suffix() {
        let formatted = format_document("the passage");
        assert_eq!(
            formatted,
            format!("<Document>: the passage{}", SCORING_PROMPT_SUFFIX)
        );
    }

    #[test]
    fn test_prompt_templates_are_stable() {
        // The scorer is prompt-sensitive; these strings are a wire contract.
        assert!(SCORING_PROMPT_PREFIX.starts_with("<|im_start|>system\n"));
        assert!(SCORING_PROMPT_PREFIX.ends_with("<|im_start|>user\n"));
        assert!(SCORING_PROMPT_PREFIX.contains("\"yes\" or \"no\""));
        assert_eq!(
            SCORING_PROMPT_SUFFIX,
            "<|im_end|>\n<|im_start|>assistant\n<think>\n\n</think>\n\n"
        );
    }

    #[test]
    fn test_endpoint_appends_model() {
        let reranker = RemoteReranker::new(
            RerankConfig::self_hosted("http://scorer.local:8080/v1/inference")
                .with_model("Qwen/Qwen3-Reranker-4B"),
        )
        .unwrap();
        assert_eq!(
            reranker.endpoint(),
            "http://scorer.local:8080/v1/inference/Qwen/Qwen3-Reranker-4B"
        );
    }

    #[test]
    fn test_endpoint_keeps_model_suffixed_url() {
        let reranker = RemoteReranker::new(
            RerankConfig::self_hosted("http://scorer.local/v1/inference/Qwen/Qwen3-Reranker-4B")
                .with_model("Qwen/Qwen3-Reranker-4B"),
        )
        .unwrap();
        assert_eq!(
            reranker.endpoint(),
            "http://scorer.local/v1/inference/Qwen/Qwen3-Reranker-4B"
        );
    }

    #[test]
    fn test_parse_indexed_shape_sorts_by_index() {
        let parsed: ScoreResponse = serde_json::from_value(json!({
            "results": [
                {"index": 2, "relevance_score": 0.2},
                {"index": 0, "relevance_score": 0.9},
                {"index": 1, "relevance_score": 0.5}
            ],
            "usage": {"prompt_tokens": 321},
            "id": "req-7"
        }))
        .unwrap();
        let scores = parsed.into_batch_scores();
        assert_eq!(scores.scores, vec![0.9, 0.5, 0.2]);
        assert_eq!(scores.input_tokens, 321);
        assert_eq!(scores.request_id.as_deref(), Some("req-7"));
    }

    #[test]
    fn test_parse_flat_shape() {
        let parsed: ScoreResponse =
            serde_json::from_value(json!({ "scores": [0.1, 0.2, 0.3] })).unwrap();
        let scores = parsed.into_batch_scores();
        assert_eq!(scores.scores, vec![0.1, 0.2, 0.3]);
        assert_eq!(scores.input_tokens, 0);
        assert!(scores.request_id.is_none());
    }

    #[test]
    fn test_both_shapes_normalize_identically() {
        let indexed: ScoreResponse = serde_json::from_value(json!({
            "results": [
                {"index": 1, "relevance_score": 0.4},
                {"index": 0, "relevance_score": 0.8}
            ]
        }))
        .unwrap();
        let flat: ScoreResponse = serde_json::from_value(json!({ "scores": [0.8, 0.4] })).unwrap();
        assert_eq!(
            indexed.into_batch_scores().scores,
            flat.into_batch_scores().scores
        );
    }

    #[test]
    fn test_unrecognized_body_is_rejected() {
        let result = serde_json::from_value::<ScoreResponse>(json!({ "answer": 42 }));
        assert!(result.is_err());

        let result = serde_json::from_value::<ScoreResponse>(json!({
            "results": [{"index": 0}]
        }));
        assert!(result.is_err(), "entries without scores must not parse");
    }

    #[tokio::test]
    async fn test_empty_documents_skip_the_network() {
        // base_url points nowhere; an empty input must not touch it.
        let reranker =
            RemoteReranker::new(RerankConfig::self_hosted("http://127.0.0.1:1/nope")).unwrap();
        let results = reranker.rerank_documents("query", &[], None).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_provider_name_detection() {
        let deepinfra = RemoteReranker::new(RerankConfig::default()).unwrap();
        assert_eq!(deepinfra.name(), "deepinfra");
        assert_eq!(deepinfra.model(), "Qwen/Qwen3-Reranker-4B");

        let hosted =
            RemoteReranker::new(RerankConfig::self_hosted("http://scorer.local")).unwrap();
        assert_eq!(hosted.name(), "remote");
    }
}
