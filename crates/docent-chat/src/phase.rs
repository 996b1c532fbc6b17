use crate::error::StreamFailure;

/// Controller states, used in log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Validating,
    Retrieving,
    Filtering,
    Composing,
    Streaming,
    Persisting,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Retrieving => "retrieving",
            Self::Filtering => "filtering",
            Self::Composing => "composing",
            Self::Streaming => "streaming",
            Self::Persisting => "persisting",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a spawned run ended
#[derive(Debug)]
pub enum SessionOutcome {
    Completed { persisted: bool },
    Failed(StreamFailure),
    Cancelled,
}

impl SessionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "done",
            Self::Failed(_) => "error",
            Self::Cancelled => "cancelled",
        }
    }
}
