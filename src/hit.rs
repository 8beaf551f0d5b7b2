//! Memory hit model and text normalization.
//!
//! Retrieved hits arrive as loosely structured search-engine documents.
//! [`MemoryHit`] keeps the two fields the pipeline acts on (`memory_type`,
//! `score`) typed and carries everything else as an opaque JSON payload,
//! including the optional `_source` envelope search engines wrap hits in.
//!
//! [`MemoryHit::rerank_text`] turns a hit into the single scorable string
//! the reranker sees:
//!
//! | Kind | Field(s) | Rendered as |
//! |------|----------|-------------|
//! | `episodic_memory` | `episode` | `Episode Memory: {episode}` |
//! | `foresight` | `foresight` (or `content`), `evidence` | `Foresight: {f} (Evidence: {e})` |
//! | `event_log` | `atomic_fact` | `Atomic Fact: {fact}` |
//! | anything else | first non-blank of `episode`, `atomic_fact`, `foresight`, `content`, `summary`, `subject` | raw field value |
//!
//! When nothing matches, the whole hit is serialized to JSON, so the
//! function is total: every hit yields a non-empty document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind tag of a retrieved memory hit.
///
/// Unknown tags deserialize to [`MemoryKind::Generic`] rather than failing,
/// since upstream indices add kinds faster than consumers update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A narrated episode of past interaction.
    EpisodicMemory,
    /// A prediction, optionally backed by evidence.
    Foresight,
    /// An atomic fact extracted from an event log.
    EventLog,
    /// Anything else, scored via the generic field priority list.
    #[default]
    #[serde(other)]
    Generic,
}

/// A retrieved memory hit: typed kind and score plus the opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHit {
    /// Kind tag, read from the hit's top level.
    #[serde(default)]
    pub memory_type: MemoryKind,
    /// Retrieval score. Overwritten with the rerank score on the reranked
    /// copies; kept as the ordering key on the degraded path.
    #[serde(default)]
    pub score: f64,
    /// Remaining hit payload. Text fields live either here or inside a
    /// nested `_source` object.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Generic extraction priority, most specific field first.
const GENERIC_TEXT_FIELDS: [&str; 6] = [
    "episode",
    "atomic_fact",
    "foresight",
    "content",
    "summary",
    "subject",
];

impl MemoryHit {
    /// Create an empty hit of the given kind.
    pub fn new(memory_type: MemoryKind) -> Self {
        Self {
            memory_type,
            score: 0.0,
            fields: Map::new(),
        }
    }

    /// Set a payload field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set the retrieval score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// The document text this hit contributes to reranking.
    ///
    /// Total and deterministic: falls through kind-specific extraction,
    /// then the generic field priority list, then JSON serialization of
    /// the whole hit.
    pub fn rerank_text(&self) -> String {
        if let Some(text) = self.kind_text() {
            return text;
        }
        for field in GENERIC_TEXT_FIELDS {
            if let Some(text) = self.field_text(field) {
                return text.to_string();
            }
        }
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    fn kind_text(&self) -> Option<String> {
        match self.memory_type {
            MemoryKind::EpisodicMemory => self
                .field_text("episode")
                .map(|episode| format!("Episode Memory: {}", episode)),
            MemoryKind::Foresight => {
                let foresight = self
                    .field_text("foresight")
                    .or_else(|| self.field_text("content"))?;
                Some(match self.field_text("evidence") {
                    Some(evidence) => {
                        format!("Foresight: {} (Evidence: {})", foresight, evidence)
                    }
                    None => format!("Foresight: {}", foresight),
                })
            }
            MemoryKind::EventLog => self
                .field_text("atomic_fact")
                .map(|fact| format!("Atomic Fact: {}", fact)),
            MemoryKind::Generic => None,
        }
    }

    /// Payload object text fields are read from: the `_source` envelope
    /// when present, the top-level fields otherwise.
    fn source(&self) -> &Map<String, Value> {
        self.fields
            .get("_source")
            .and_then(Value::as_object)
            .unwrap_or(&self.fields)
    }

    fn field_text(&self, name: &str) -> Option<&str> {
        self.source()
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit_from_json(value: Value) -> MemoryHit {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_episodic_text() {
        let hit = MemoryHit::new(MemoryKind::EpisodicMemory)
            .with_field("episode", "we deployed the new index");
        assert_eq!(
            hit.rerank_text(),
            "Episode Memory: we deployed the new index"
        );
    }

    #[test]
    fn test_foresight_with_evidence() {
        let hit = MemoryHit::new(MemoryKind::Foresight)
            .with_field("foresight", "traffic will spike")
            .with_field("evidence", "last three launches");
        assert_eq!(
            hit.rerank_text(),
            "Foresight: traffic will spike (Evidence: last three launches)"
        );
    }

    #[test]
    fn test_foresight_without_evidence() {
        let hit = MemoryHit::new(MemoryKind::Foresight).with_field("foresight", "traffic spike");
        assert_eq!(hit.rerank_text(), "Foresight: traffic spike");
    }

    #[test]
    fn test_foresight_falls_back_to_content() {
        let hit = MemoryHit::new(MemoryKind::Foresight).with_field("content", "stored as content");
        assert_eq!(hit.rerank_text(), "Foresight: stored as content");
    }

    #[test]
    fn test_event_log_text() {
        let hit =
            MemoryHit::new(MemoryKind::EventLog).with_field("atomic_fact", "user prefers dark mode");
        assert_eq!(hit.rerank_text(), "Atomic Fact: user prefers dark mode");
    }

    #[test]
    fn test_typed_hit_missing_field_uses_generic_priority() {
        // Episodic hit without an episode falls through to the generic list.
        let hit = MemoryHit::new(MemoryKind::EpisodicMemory).with_field("summary", "a summary");
        assert_eq!(hit.rerank_text(), "a summary");
    }

    #[test]
    fn test_generic_priority_order() {
        let hit = MemoryHit::new(MemoryKind::Generic)
            .with_field("subject", "low priority")
            .with_field("summary", "mid priority")
            .with_field("content", "high priority");
        assert_eq!(hit.rerank_text(), "high priority");
    }

    #[test]
    fn test_blank_fields_are_skipped() {
        let hit = MemoryHit::new(MemoryKind::Generic)
            .with_field("content", "   ")
            .with_field("summary", "real text");
        assert_eq!(hit.rerank_text(), "real text");
    }

    #[test]
    fn test_source_envelope_shadows_top_level() {
        let hit = hit_from_json(json!({
            "memory_type": "episodic_memory",
            "episode": "top level, ignored",
            "_source": { "episode": "from the envelope" }
        }));
        assert_eq!(hit.rerank_text(), "Episode Memory: from the envelope");
    }

    #[test]
    fn test_source_envelope_is_exclusive() {
        // With an envelope present, top-level text fields are not consulted.
        let hit = hit_from_json(json!({
            "content": "top level only",
            "_source": { "irrelevant": 1 }
        }));
        let text = hit.rerank_text();
        assert!(text.starts_with('{'), "expected JSON last resort: {}", text);
    }

    #[test]
    fn test_last_resort_serializes_hit() {
        let hit = MemoryHit::new(MemoryKind::Generic).with_field("vector_id", 42);
        let text = hit.rerank_text();
        assert!(!text.is_empty());
        assert!(text.contains("vector_id"));
        assert!(text.contains("42"));
    }

    #[test]
    fn test_unknown_kind_deserializes_to_generic() {
        let hit = hit_from_json(json!({
            "memory_type": "brand_new_kind",
            "content": "still scorable"
        }));
        assert_eq!(hit.memory_type, MemoryKind::Generic);
        assert_eq!(hit.rerank_text(), "still scorable");
    }

    #[test]
    fn test_missing_kind_and_score_default() {
        let hit = hit_from_json(json!({ "content": "text" }));
        assert_eq!(hit.memory_type, MemoryKind::Generic);
        assert_eq!(hit.score, 0.0);
    }

    #[test]
    fn test_score_round_trip() {
        let hit = hit_from_json(json!({
            "memory_type": "event_log",
            "score": 0.87,
            "atomic_fact": "fact"
        }));
        assert_eq!(hit.score, 0.87);
        let back = serde_json::to_value(&hit).unwrap();
        assert_eq!(back["score"], json!(0.87));
        assert_eq!(back["memory_type"], json!("event_log"));
        assert_eq!(back["atomic_fact"], json!("fact"));
    }

    #[test]
    fn test_non_string_fields_fall_through() {
        let hit = hit_from_json(json!({
            "content": 17,
            "summary": "textual summary"
        }));
        assert_eq!(hit.rerank_text(), "textual summary");
    }
}
