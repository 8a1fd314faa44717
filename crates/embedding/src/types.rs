use serde::{Deserialize, Serialize};
use theory_explorer_common::{Result, TheoryExplorerError};

/// Ollama embeddings request
#[derive(Debug, Clone, Serialize)]
pub struct OllamaEmbedRequest {
    /// Model name (e.g., "nomic-embed-text")
    pub model: String,

    /// Text to embed
    pub prompt: String,
}

/// Ollama embeddings response
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaEmbedResponse {
    /// Embedding vector
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl OllamaEmbedResponse {
    /// Extract the vector, rejecting missing or empty payloads
    pub fn into_vector(self) -> Result<Vec<f32>> {
        non_empty(self.embedding, "Ollama response has no embedding field")
    }
}

/// Gemini embedContent request
#[derive(Debug, Clone, Serialize)]
pub struct GeminiEmbedRequest {
    /// Fully qualified model ("models/text-embedding-004")
    pub model: String,

    /// Content to embed
    pub content: GeminiContent,
}

impl GeminiEmbedRequest {
    pub fn new(model: &str, text: impl Into<String>) -> Self {
        Self {
            model: format!("models/{}", model),
            content: GeminiContent {
                parts: vec![GeminiPart { text: text.into() }],
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeminiPart {
    pub text: String,
}

/// Gemini embedContent response
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiEmbedResponse {
    #[serde(default)]
    pub embedding: Option<GeminiEmbedding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiEmbedding {
    #[serde(default)]
    pub values: Option<Vec<f32>>,
}

impl GeminiEmbedResponse {
    /// Extract `embedding.values`; no other response shape is accepted
    pub fn into_vector(self) -> Result<Vec<f32>> {
        non_empty(
            self.embedding.and_then(|e| e.values),
            "Gemini response has no embedding.values field",
        )
    }
}

fn non_empty(values: Option<Vec<f32>>, missing: &str) -> Result<Vec<f32>> {
    match values {
        None => Err(TheoryExplorerError::embedding(missing)),
        Some(v) if v.is_empty() => Err(TheoryExplorerError::embedding("Empty embedding vector")),
        Some(v) => Ok(v),
    }
}
