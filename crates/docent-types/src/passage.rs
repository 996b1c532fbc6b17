use serde::{Deserialize, Serialize};

/// A candidate grounding unit produced by one retrieval.
///
/// `id` is the 1-based ordinal within that retrieval. It is what the model
/// cites as `[id]` and is not unique across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedPassage {
    pub id: u32,
    pub name: String,
    pub page_content: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl RetrievedPassage {
    pub fn new(id: u32, name: impl Into<String>, page_content: impl Into<String>, score: f32) -> Self {
        Self {
            id,
            name: name.into(),
            page_content: page_content.into(),
            score,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
