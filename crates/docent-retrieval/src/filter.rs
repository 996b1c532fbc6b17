use docent_types::RetrievedPassage;

/// Reference threshold for cosine scores from the production index
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.75;

/// Keeps passages scoring at or above a threshold, order preserved.
///
/// Pure: the same input and threshold always give the same output. An empty
/// result is not an error; the answer then proceeds ungrounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceFilter {
    threshold: f32,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_RELEVANCE_THRESHOLD)
    }
}

impl RelevanceFilter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn apply(&self, scored: &[RetrievedPassage]) -> Vec<RetrievedPassage> {
        scored
            .iter()
            .filter(|p| p.score >= self.threshold)
            .cloned()
            .collect()
    }
}
