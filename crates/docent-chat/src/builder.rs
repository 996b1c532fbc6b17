use std::sync::Arc;

use anyhow::{anyhow, Result};
use docent_llm::ChatClient;
use docent_persist::PersistenceClient;
use docent_retrieval::PassageRetriever;

use crate::config::SessionConfig;
use crate::session::ChatSession;
use crate::tokens::TokenCounter;

/// Builder for constructing a ChatSession
pub struct ChatSessionBuilder {
    chat_client: Option<Arc<dyn ChatClient>>,
    retriever: Option<Arc<dyn PassageRetriever>>,
    persistence: Option<Arc<dyn PersistenceClient>>,
    config: SessionConfig,
}

impl ChatSessionBuilder {
    pub fn new() -> Self {
        Self {
            chat_client: None,
            retriever: None,
            persistence: None,
            config: SessionConfig::default(),
        }
    }

    /// Set the streaming model client
    pub fn chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = Some(client);
        self
    }

    pub fn retriever(mut self, retriever: Arc<dyn PassageRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn persistence(mut self, client: Arc<dyn PersistenceClient>) -> Self {
        self.persistence = Some(client);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ChatSession> {
        let chat_client = self
            .chat_client
            .ok_or_else(|| anyhow!("Chat client is required"))?;
        let retriever = self
            .retriever
            .ok_or_else(|| anyhow!("Retriever is required"))?;
        let persistence = self
            .persistence
            .ok_or_else(|| anyhow!("Persistence client is required"))?;

        Ok(ChatSession::new(
            chat_client,
            retriever,
            persistence,
            Arc::new(TokenCounter::new()?),
            self.config,
        ))
    }
}

impl Default for ChatSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
