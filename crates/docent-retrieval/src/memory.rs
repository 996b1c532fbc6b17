use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::index::{IndexMatch, VectorIndex};
use crate::vector_math::{cosine_similarity, sort_descending};

#[derive(Debug, Clone)]
struct StoredVector {
    id: String,
    values: Vec<f32>,
    text: String,
    metadata: Map<String, Value>,
}

/// Brute-force cosine index partitioned by namespace
#[derive(Default)]
pub struct InMemoryVectorIndex {
    namespaces: RwLock<HashMap<String, Vec<StoredVector>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a vector inside one namespace
    pub async fn upsert(
        &self,
        namespace: &str,
        id: impl Into<String>,
        values: Vec<f32>,
        text: impl Into<String>,
        metadata: Map<String, Value>,
    ) {
        let id = id.into();
        let mut namespaces = self.namespaces.write().await;
        let vectors = namespaces.entry(namespace.to_string()).or_default();
        vectors.retain(|v| v.id != id);
        vectors.push(StoredVector {
            id,
            values,
            text: text.into(),
            metadata,
        });
    }

    pub async fn count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        let namespaces = self.namespaces.read().await;
        let Some(vectors) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches = Vec::with_capacity(vectors.len());
        for stored in vectors {
            matches.push(IndexMatch {
                id: stored.id.clone(),
                score: cosine_similarity(vector, &stored.values)?,
                text: stored.text.clone(),
                metadata: stored.metadata.clone(),
            });
        }

        sort_descending(&mut matches, |m| m.score);
        matches.truncate(top_k);
        Ok(matches)
    }
}
