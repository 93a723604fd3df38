//! HTTP client for the external text embedding service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::provider::{ProviderError, TextEmbedder};

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Calls an embedding service accepting `{"text": ...}` and returning
/// `{"embedding": [...]}`. Embeddings are produced externally; this crate
/// never computes them itself.
pub struct HttpEmbedder {
    client: Client,
    url: String,
}

impl HttpEmbedder {
    pub fn new(url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { client, url }
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "Embedding service returned status {}",
                response.status()
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(ProviderError::Parse("empty embedding vector".to_string()));
        }

        Ok(parsed.embedding)
    }
}
