//! Retrieval records: indexed metadata, search candidates, and answers.

use serde::{Deserialize, Serialize};

/// Per-item metadata as stored alongside its vector.
///
/// Shaped as an open-ended JSON object so datasets can carry arbitrary
/// auxiliary columns next to the required `url` / `desc` / `category`
/// fields. Iteration order is insertion order (serde_json is built with
/// `preserve_order`), which keeps prompt enumeration reproducible.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A retrieved item plus its similarity distance, pending reranking.
///
/// `distance` is squared Euclidean, smaller = more similar. Backends
/// that do not report distances leave it `None`; the rerank
/// short-circuit keys off its presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Metadata fields of the underlying item.
    #[serde(flatten)]
    pub fields: Metadata,

    /// Similarity distance reported by the vector store, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl Candidate {
    /// Candidate without a backend-reported distance.
    pub fn new(fields: Metadata) -> Self {
        Self {
            fields,
            distance: None,
        }
    }

    /// Candidate carrying the backend's distance.
    pub fn with_distance(fields: Metadata, distance: f32) -> Self {
        Self {
            fields,
            distance: Some(distance),
        }
    }

    /// Image reference of the item, when present.
    pub fn url(&self) -> Option<&str> {
        self.fields.get("url").and_then(serde_json::Value::as_str)
    }

    /// String value of an arbitrary metadata field, when present.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(serde_json::Value::as_str)
    }
}

/// Result of one question-answering turn.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Natural-language answer for the user.
    pub answer_text: String,

    /// Index into `references` of the primarily recommended item, if
    /// the model committed to one.
    pub recommended_index: Option<usize>,

    /// The candidates the answer was grounded in.
    pub references: Vec<Candidate>,
}

impl Answer {
    /// Answer with no recommendation.
    pub fn plain(answer_text: impl Into<String>, references: Vec<Candidate>) -> Self {
        Self {
            answer_text: answer_text.into(),
            recommended_index: None,
            references,
        }
    }

    /// The recommended candidate, if the index is set.
    pub fn recommended(&self) -> Option<&Candidate> {
        self.recommended_index.and_then(|i| self.references.get(i))
    }
}
