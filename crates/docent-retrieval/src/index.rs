use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// One scored nearest-neighbour hit
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl IndexMatch {
    /// Source document name, from `name` then `source`
    pub fn display_name(&self) -> &str {
        ["name", "source"]
            .iter()
            .find_map(|key| self.metadata.get(*key).and_then(Value::as_str))
            .unwrap_or("Untitled")
    }
}

/// Scored nearest-neighbour lookup scoped to one namespace.
///
/// Implementations must never return vectors stored under another namespace.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>>;
}
