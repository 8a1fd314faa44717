//! Theory Explorer embedding providers
//!
//! Text-to-vector adapters behind a single `EmbeddingProvider` trait

mod gemini;
mod http;
mod ollama;
mod provider;
mod retry;
mod types;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use provider::{create_provider, EmbeddingProvider, TimeoutProvider};
pub use types::{
    GeminiContent, GeminiEmbedRequest, GeminiEmbedResponse, GeminiEmbedding, GeminiPart,
    OllamaEmbedRequest, OllamaEmbedResponse,
};
