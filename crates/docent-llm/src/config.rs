// Configuration layer for provider client creation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::traits::{ChatClient, EmbeddingClient};

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL for the API (optional, defaults to https://api.openai.com/v1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI(OpenAIConfig),
}

impl ProviderConfig {
    /// Create OpenAI provider config
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::OpenAI(OpenAIConfig::new(api_key))
    }

    /// Create an OpenAI-compatible provider config with a custom endpoint
    pub fn openai_compatible(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::OpenAI(OpenAIConfig::new(api_key).with_base_url(base_url))
    }

    /// Build the chat and embedding handles, both backed by one client
    pub fn create_clients(self) -> Result<ProviderClients> {
        match self {
            ProviderConfig::OpenAI(openai_config) => {
                let mut client = crate::openai::OpenAIClient::new(openai_config.api_key)?;
                if let Some(base_url) = openai_config.base_url {
                    client = client.with_base_url(base_url);
                }
                let client = Arc::new(client);
                Ok(ProviderClients {
                    chat: client.clone(),
                    embeddings: client,
                })
            }
        }
    }
}

/// Trait-object handles produced by [`ProviderConfig::create_clients`]
#[derive(Clone)]
pub struct ProviderClients {
    pub chat: Arc<dyn ChatClient>,
    pub embeddings: Arc<dyn EmbeddingClient>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_config() {
        let ProviderConfig::OpenAI(config) = ProviderConfig::openai("test-key");
        assert_eq!(config.api_key, "test-key");
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_compatible_endpoint() {
        let ProviderConfig::OpenAI(config) =
            ProviderConfig::openai_compatible("k", "http://localhost:11434/v1");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:11434/v1"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = ProviderConfig::openai_compatible("k", "http://localhost:8080/v1");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"type\":\"openai\""));
        let back: ProviderConfig = serde_json::from_str(&json).unwrap();
        let ProviderConfig::OpenAI(inner) = back;
        assert_eq!(inner.api_key, "k");
    }

    #[test]
    fn test_create_clients() {
        assert!(ProviderConfig::openai("k").create_clients().is_ok());
    }
}
