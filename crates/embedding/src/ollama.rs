use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use theory_explorer_common::Result;
use tracing::{debug, info};

use crate::http::{build_client, send_json};
use crate::provider::EmbeddingProvider;
use crate::retry::with_retry;
use crate::types::{OllamaEmbedRequest, OllamaEmbedResponse};

/// Ollama embeddings client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        max_attempts: u32,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let client = build_client(timeout)?;

        info!("Ollama client initialized: {} (model: {})", base_url, model);
        Ok(Self {
            base_url,
            model,
            client,
            max_attempts: max_attempts.max(1),
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Override the base backoff delay between attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/api/embeddings", self.base_url)
    }

    /// Single attempt to generate embedding
    async fn try_embed(&self, url: &str, request: &OllamaEmbedRequest) -> Result<Vec<f32>> {
        let response: OllamaEmbedResponse = send_json(self.client.post(url).json(request)).await?;
        response.into_vector()
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.embeddings_url();
        debug!("Generating embedding - Model: {}, Text length: {}", self.model, text.len());

        let request = OllamaEmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let embedding = with_retry("Ollama embedding", self.max_attempts, self.retry_delay, || {
            self.try_embed(&url, &request)
        })
        .await?;

        debug!("Received embedding - Dimension: {}", embedding.len());
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
