use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form record fields kept alongside each vector
pub type Meta = Map<String, Value>;

/// Seed/upsert input record describing one theory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheoryRecord {
    /// Stable identifier
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Kind of entry (theory, method, parameter, ...)
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_concepts: Option<Vec<String>>,

    /// Consensus status (accepted, experimental, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,

    /// Any other fields present in the input, carried into `meta` untouched
    #[serde(flatten)]
    pub extra: Meta,
}

impl TheoryRecord {
    /// Minimal record with only the required descriptive fields
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
        domain: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            domain: domain.into(),
            era: None,
            summary: summary.into(),
            key_concepts: None,
            status: None,
            tags: None,
            sources: None,
            extra: Meta::new(),
        }
    }

    /// The record as a JSON object, used as `Item::meta`
    pub fn to_meta(&self) -> Meta {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // A struct always serializes to an object
            _ => Meta::new(),
        }
    }
}

/// One embedded record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier, stable across upserts
    pub id: String,

    /// Descriptive text that was embedded
    pub text: String,

    /// Embedding vector
    pub vector: Vec<f32>,

    /// Original record fields
    #[serde(default)]
    pub meta: Meta,
}

/// Ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,

    /// Cosine similarity, approximately -1.0 to 1.0
    pub score: f32,

    pub meta: Meta,
}

impl SearchResult {
    pub fn new(id: String, score: f32, meta: Meta) -> Self {
        Self { id, score, meta }
    }
}

/// Bootstrap state of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    /// Nothing loaded or seeded yet; searches return nothing
    Empty,
    /// Loaded from disk or built from seed
    Ready,
}

/// Store summary for status output
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub items: usize,
    pub dimension: Option<usize>,
    pub status: StoreStatus,
    pub model: String,
}
