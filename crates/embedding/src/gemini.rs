use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use theory_explorer_common::{Result, TheoryExplorerError};
use tracing::{debug, info};

use crate::http::{build_client, send_json};
use crate::provider::EmbeddingProvider;
use crate::retry::with_retry;
use crate::types::{GeminiEmbedRequest, GeminiEmbedResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini embedContent client
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

// api_key stays out of Debug output
impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl GeminiClient {
    /// Create new Gemini client
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        max_attempts: u32,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TheoryExplorerError::config("Gemini API key cannot be empty"));
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let model = model.trim_start_matches("models/").to_string();
        let client = build_client(timeout)?;

        info!("Gemini client initialized: {} (model: {})", base_url, model);
        Ok(Self {
            base_url,
            model,
            api_key,
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

    fn embed_url(&self) -> String {
        format!("{}/v1beta/models/{}:embedContent", self.base_url, self.model)
    }

    async fn try_embed(&self, url: &str, request: &GeminiEmbedRequest) -> Result<Vec<f32>> {
        // Key goes in a header so it never shows up in URLs, errors or logs
        let builder = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request);
        let response: GeminiEmbedResponse = send_json(builder).await?;
        response.into_vector()
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.embed_url();
        debug!("Generating Gemini embedding - Model: {}, Text length: {}", self.model, text.len());

        let request = GeminiEmbedRequest::new(&self.model, text);
        let embedding = with_retry("Gemini embedding", self.max_attempts, self.retry_delay, || {
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
