use std::time::Duration;

pub const DEFAULT_GUIDELINE: &str = "You are a helpful assistant that answers questions about the user's uploaded documents. \
When document passages are provided, ground your answer in them and cite the passages you use by their [index]. \
If the passages do not contain the answer, say so before answering from general knowledge. \
Never invent document content.";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Minimum similarity for a passage to be used as grounding
    pub relevance_threshold: f32,
    /// Candidates requested from the retriever
    pub top_k: usize,
    /// Prior turns replayed to the model
    pub history_window: usize,
    /// Deadline for the model streaming phase
    pub stream_timeout: Duration,
    pub guideline: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: Some(0.3),
            max_tokens: Some(1024),
            relevance_threshold: 0.75,
            top_k: 4,
            history_window: 6,
            stream_timeout: Duration::from_secs(120),
            guideline: DEFAULT_GUIDELINE.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_relevance_threshold(mut self, threshold: f32) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn with_guideline(mut self, guideline: impl Into<String>) -> Self {
        self.guideline = guideline.into();
        self
    }
}
