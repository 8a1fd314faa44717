use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use theory_explorer_common::{AppConfig, ProviderKind, Result, TheoryExplorerError};
use tracing::info;

use crate::gemini::GeminiClient;
use crate::ollama::OllamaClient;

/// Text-to-vector contract used by the index
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text` into a fixed-dimension vector.
    ///
    /// A response without a usable vector must be an `Embedding` error,
    /// never a substituted default.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier (e.g. `"nomic-embed-text"`)
    fn model_name(&self) -> &str;
}

/// Bounds every `embed` call of the wrapped provider by a deadline
pub struct TimeoutProvider<P> {
    inner: P,
    deadline: Duration,
}

impl<P: EmbeddingProvider> TimeoutProvider<P> {
    pub fn new(inner: P, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for TimeoutProvider<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match tokio::time::timeout(self.deadline, self.inner.embed(text)).await {
            Ok(result) => result,
            Err(_) => Err(TheoryExplorerError::embedding(format!(
                "Embedding timed out after {:?}",
                self.deadline
            ))),
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Instantiate the configured embedding provider
pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    let request_timeout = Duration::from_secs(config.embed_timeout_secs);
    let deadline = overall_deadline(config.embed_timeout_secs, config.embed_max_attempts);

    info!(
        "Embedding provider: {:?} (model: {}, deadline: {:?})",
        config.embedding_provider, config.embedding_model, deadline
    );

    let provider: Arc<dyn EmbeddingProvider> = match config.embedding_provider {
        ProviderKind::Ollama => {
            let client = OllamaClient::new(
                &config.ollama_base_url,
                &config.embedding_model,
                request_timeout,
                config.embed_max_attempts,
            )?;
            Arc::new(TimeoutProvider::new(client, deadline))
        }
        ProviderKind::Gemini => {
            let api_key = config
                .gemini_api_key
                .as_deref()
                .ok_or_else(|| TheoryExplorerError::config("GEMINI_API_KEY is not set"))?;
            let client = GeminiClient::new(
                &config.gemini_base_url,
                &config.embedding_model,
                api_key,
                request_timeout,
                config.embed_max_attempts,
            )?;
            Arc::new(TimeoutProvider::new(client, deadline))
        }
    };

    Ok(provider)
}

/// Whole-call budget: every attempt may use the request timeout, plus backoff sleeps
fn overall_deadline(timeout_secs: u64, max_attempts: u32) -> Duration {
    let attempts = max_attempts.max(1);
    let backoff: u64 = (1..attempts).map(|a| 2u64.pow(a - 1)).sum();
    Duration::from_secs(timeout_secs * attempts as u64 + backoff)
}
