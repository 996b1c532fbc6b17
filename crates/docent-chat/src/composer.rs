use docent_llm::{Content, Message};
use docent_types::{ChatTurn, ResponseStyle, RetrievedPassage};

const PASSAGE_SEPARATOR: &str = "\n---\n";

/// Builds the ordered message list sent to the model:
/// guideline, optional context, bounded history, new user message.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    guideline: String,
    history_window: usize,
}

impl PromptComposer {
    pub fn new(guideline: impl Into<String>, history_window: usize) -> Self {
        Self {
            guideline: guideline.into(),
            history_window,
        }
    }

    /// Newest-first turns (as persistence returns them) to a chronological
    /// window of at most `history_window` non-deleted turns.
    pub fn history_window(&self, newest_first: Vec<ChatTurn>) -> Vec<ChatTurn> {
        let mut window: Vec<ChatTurn> = newest_first
            .into_iter()
            .filter(|t| !t.is_deleted())
            .take(self.history_window)
            .collect();
        window.reverse();
        window
    }

    pub fn compose(
        &self,
        style: ResponseStyle,
        context: &[RetrievedPassage],
        history: &[ChatTurn],
        new_message: &str,
        images: &[String],
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len().min(self.history_window) + 3);

        messages.push(Message::system(format!(
            "{}\n\nResponse style: {}. {}",
            self.guideline,
            style.as_str(),
            style_directive(style)
        )));

        if !context.is_empty() {
            messages.push(Message::system(context_block(context)));
        }

        let visible: Vec<&ChatTurn> = history.iter().filter(|t| !t.is_deleted()).collect();
        let skip = visible.len().saturating_sub(self.history_window);
        messages.extend(visible[skip..].iter().map(|t| t.to_message()));

        messages.push(Message::human(Content::with_images(
            new_message,
            images.iter().cloned(),
        )));

        messages
    }
}

fn style_directive(style: ResponseStyle) -> &'static str {
    match style {
        ResponseStyle::Concise => "Answer in a few sentences and skip background the user did not ask for.",
        ResponseStyle::Detailed => "Give a thorough answer with explanation and relevant detail from the passages.",
        ResponseStyle::Technical => "Use precise technical language and include exact figures, terms and definitions.",
    }
}

fn context_block(context: &[RetrievedPassage]) -> String {
    let passages = context
        .iter()
        .map(|p| format!("[{}] {}", p.id, p.page_content))
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR);
    format!("Document passages:\n\n{}", passages)
}
