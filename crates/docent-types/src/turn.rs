use crate::passage::RetrievedPassage;
use chrono::{DateTime, Utc};
use docent_llm::{Content, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Prior content of an edited turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    pub content: String,
    pub edited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<RetrievedPassage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Free-form keys written by other parts of the application
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One user or assistant utterance.
///
/// A soft-deleted turn keeps its content so it can be restored, but it never
/// contributes to conversation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edit_history: Vec<EditRecord>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

impl ChatTurn {
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id, Role::User, content)
    }

    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id, Role::Assistant, content)
    }

    fn new(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            edit_history: Vec::new(),
            deleted: false,
            deleted_at: None,
            metadata: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_metadata(mut self, metadata: TurnMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted || self.deleted_at.is_some()
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
    }

    /// Images attached to a user turn, empty if none
    pub fn images(&self) -> &[String] {
        self.metadata
            .as_ref()
            .and_then(|m| m.images.as_deref())
            .unwrap_or(&[])
    }

    pub fn sources(&self) -> &[RetrievedPassage] {
        self.metadata
            .as_ref()
            .and_then(|m| m.sources.as_deref())
            .unwrap_or(&[])
    }

    /// Convert to a model message, keeping the original role.
    /// Historical images are not replayed to the model.
    pub fn to_message(&self) -> Message {
        let content = Content::text(self.content.clone());
        match self.role {
            Role::User => Message::human(content),
            Role::Assistant => Message::ai(content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_soft_delete_keeps_content() {
        let mut turn = ChatTurn::user("s-user", "keep me");
        assert!(!turn.is_deleted());
        turn.soft_delete(Utc::now());
        assert!(turn.is_deleted());
        assert_eq!(turn.content, "keep me");
    }

    #[test]
    fn test_to_message_preserves_role() {
        assert_eq!(ChatTurn::user("a", "q").to_message().role(), "user");
        assert_eq!(ChatTurn::assistant("b", "r").to_message().role(), "assistant");
    }

    #[test]
    fn test_metadata_serialization() {
        let mut extra = serde_json::Map::new();
        extra.insert("pinned".to_string(), json!(true));
        let turn = ChatTurn::assistant("s-assistant", "answer").with_metadata(TurnMetadata {
            sources: Some(vec![RetrievedPassage::new(1, "doc", "text", 0.9)]),
            token_count: Some(3),
            extra,
            ..Default::default()
        });

        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["role"], json!("assistant"));
        assert_eq!(value["metadata"]["tokenCount"], json!(3));
        assert_eq!(value["metadata"]["pinned"], json!(true));
        assert_eq!(value["metadata"]["sources"][0]["pageContent"], json!("text"));
        assert!(value.get("editHistory").is_none());

        let back: ChatTurn = serde_json::from_value(value).unwrap();
        assert_eq!(back.sources().len(), 1);
    }
}
