//! Shared LLM client and interaction utilities
//!
//! Provides a common interface for OpenAI API interactions used across services.

use rig::providers::openai;

/// Shared LLM client wrapper
#[derive(Clone)]
pub struct LlmClient {
    client: openai::Client,
}

impl LlmClient {
    /// Create a new LLM client with the provided API key
    pub fn new(api_key: &str) -> Self {
        Self {
            client: openai::Client::new(api_key),
        }
    }

    /// Create a client from `OPENAI_API_KEY`, if set. The language model is
    /// optional in this service; everything factual works without it.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        Some(Self::new(&api_key))
    }

    /// Get a reference to the underlying OpenAI client
    /// Use this to create extractors with custom configuration
    pub fn openai_client(&self) -> &openai::Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_constructs_without_io() {
        // Construction only stores credentials; no request is made
        let client = LlmClient::new("test-key");
        let _ = client.openai_client();
    }
}
