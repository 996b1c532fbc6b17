use std::sync::Arc;

use async_trait::async_trait;
use docent_llm::{EmbeddingClient, EmbeddingRequest};
use docent_types::RetrievedPassage;
use serde_json::Value;

use crate::error::{Result, RetrievalError};
use crate::index::VectorIndex;
use crate::vector_math::sort_descending;

/// Question in, scored passages out
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    /// At most `k` passages from `namespace`, highest score first
    async fn retrieve(&self, query: &str, namespace: &str, k: usize) -> Result<Vec<RetrievedPassage>>;
}

/// Embedding client + vector index
pub struct Retriever {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    embedding_model: String,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            embedding_model: embedding_model.into(),
        }
    }
}

#[async_trait]
impl PassageRetriever for Retriever {
    async fn retrieve(&self, query: &str, namespace: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        let vector = self
            .embedder
            .embed(EmbeddingRequest::new(&self.embedding_model, query))
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("Embedding failed: {:#}", e)))?;

        if vector.is_empty() {
            return Err(RetrievalError::Misconfigured(
                "Embedding model returned an empty vector".to_string(),
            ));
        }

        let mut matches = self.index.query(namespace, &vector, k).await?;
        sort_descending(&mut matches, |m| m.score);
        matches.truncate(k);

        tracing::debug!(
            namespace = %namespace,
            candidates = matches.len(),
            top_score = matches.first().map(|m| m.score),
            "Retrieved candidate passages"
        );

        Ok(matches
            .into_iter()
            .zip(1u32..)
            .map(|(m, ordinal)| {
                let name = m.display_name().to_string();
                let mut metadata = m.metadata;
                metadata.insert("vectorId".to_string(), Value::String(m.id));
                RetrievedPassage::new(ordinal, name, m.text, m.score)
                    .with_metadata(Value::Object(metadata))
            })
            .collect())
    }
}
