use crate::passage::RetrievedPassage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker that starts every event line on the wire
pub const EVENT_PREFIX: &str = "data: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Sources,
    Text,
    Image,
    Done,
    Error,
}

/// One event of the chat stream protocol.
///
/// On the wire every event is `{ "type", "content", "metadata"? }` with a
/// string `content`; `Sources` carries its passages as a JSON-encoded array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEvent", into = "WireEvent")]
pub enum StreamEvent {
    Sources(Vec<RetrievedPassage>),
    Text(String),
    /// Reserved; consumers observe it without acting on it
    Image(String),
    Done,
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: EventKind,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("line does not start with the event prefix")]
    MissingPrefix,

    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Sources(_) => EventKind::Sources,
            Self::Text(_) => EventKind::Text,
            Self::Image(_) => EventKind::Image,
            Self::Done => EventKind::Done,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// `Done` and `Error` end a stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    pub fn to_json(&self) -> String {
        // A WireEvent is strings and a JSON value; encoding cannot fail
        serde_json::to_string(&WireEvent::from(self.clone())).unwrap_or_default()
    }

    /// Full frame: prefix, JSON, blank line
    pub fn to_sse_frame(&self) -> String {
        format!("{}{}\n\n", EVENT_PREFIX, self.to_json())
    }

    /// Decode one already-split line such as `data: {"type":"text",...}`
    pub fn decode_line(line: &str) -> Result<Self, WireError> {
        let payload = line
            .strip_prefix(EVENT_PREFIX)
            .or_else(|| line.strip_prefix("data:"))
            .ok_or(WireError::MissingPrefix)?;
        Ok(serde_json::from_str(payload.trim())?)
    }
}

impl From<StreamEvent> for WireEvent {
    fn from(event: StreamEvent) -> Self {
        let kind = event.kind();
        let content = match event {
            StreamEvent::Sources(passages) => {
                serde_json::to_string(&passages).unwrap_or_else(|_| "[]".to_string())
            }
            StreamEvent::Text(s) | StreamEvent::Image(s) | StreamEvent::Error(s) => s,
            StreamEvent::Done => String::new(),
        };
        WireEvent {
            kind,
            content,
            metadata: None,
        }
    }
}

impl TryFrom<WireEvent> for StreamEvent {
    type Error = serde_json::Error;

    fn try_from(wire: WireEvent) -> Result<Self, serde_json::Error> {
        Ok(match wire.kind {
            EventKind::Sources => {
                let passages = if wire.content.trim().is_empty() {
                    Vec::new()
                } else {
                    serde_json::from_str(&wire.content)?
                };
                StreamEvent::Sources(passages)
            }
            EventKind::Text => StreamEvent::Text(wire.content),
            EventKind::Image => StreamEvent::Image(wire.content),
            EventKind::Done => StreamEvent::Done,
            EventKind::Error => StreamEvent::Error(wire.content),
        })
    }
}
