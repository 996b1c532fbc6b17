use docent_types::{ChatTurn, RetrievedPassage};

/// Local reconstruction of the conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerState {
    pub messages: Vec<ChatTurn>,
    pub loading: bool,
    /// Text of the assistant turn currently being streamed
    pub streaming_text: String,
    pub sources: Vec<RetrievedPassage>,
    pub error: Option<String>,
}

impl ConsumerState {
    /// Clear per-request buffers after any terminal outcome
    pub(crate) fn finish(&mut self) {
        self.loading = false;
        self.streaming_text.clear();
        self.sources.clear();
    }
}
