use serde::{Deserialize, Serialize};

use super::content::Content;

/// Who a prompt message is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    System,
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One entry of a prompt, provider-agnostic. Serializes as
/// `{"role": ..., "content": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "role")]
    pub speaker: Speaker,
    pub content: Content,
}

impl Message {
    pub fn new(speaker: Speaker, content: impl Into<Content>) -> Self {
        Self {
            speaker,
            content: content.into(),
        }
    }

    /// Instructions or grounding context
    pub fn system(content: impl Into<Content>) -> Self {
        Self::new(Speaker::System, content)
    }

    pub fn human(content: impl Into<Content>) -> Self {
        Self::new(Speaker::User, content)
    }

    pub fn ai(content: impl Into<Content>) -> Self {
        Self::new(Speaker::Assistant, content)
    }

    /// Role name as the chat completions API spells it
    pub fn role(&self) -> &'static str {
        self.speaker.as_str()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }
}
