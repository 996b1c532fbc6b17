use std::sync::{Arc, Mutex};

use chrono::Utc;
use docent_llm::CircularLineBuffer;
use docent_types::{
    ChatRequestBody, ChatTurn, ResponseStyle, Role, StreamEvent, TurnMetadata, EVENT_PREFIX,
};
use futures::future::{AbortHandle, Abortable};
use tokio::sync::watch;

use crate::error::ClientError;
use crate::state::ConsumerState;
use crate::transport::{ChatTransport, StreamReader};

const CONNECTION_CLOSED: &str = "Connection closed before the response completed";

/// How one `send_message` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// `done` received, assistant turn appended
    Completed,
    /// Rejected before the stream opened, or an `error` event arrived
    Failed,
    /// Stream ended without a terminal event
    Closed,
    /// Caller called `cancel`
    Cancelled,
}

/// Owns the reader and guarantees `release` runs at most once
struct ReaderGuard {
    reader: Box<dyn StreamReader>,
    released: bool,
}

impl ReaderGuard {
    fn new(reader: Box<dyn StreamReader>) -> Self {
        Self {
            reader,
            released: false,
        }
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.reader.release().await;
        }
    }
}

/// Drives requests against one project and folds the event stream into
/// [`ConsumerState`]. Methods take `&self` so `cancel` can be called while a
/// send is in flight.
pub struct ChatConsumer {
    transport: Arc<dyn ChatTransport>,
    project_id: String,
    state: watch::Sender<ConsumerState>,
    abort: Mutex<Option<AbortHandle>>,
    last_style: Mutex<ResponseStyle>,
}

impl ChatConsumer {
    pub fn new(transport: Arc<dyn ChatTransport>, project_id: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConsumerState::default());
        Self {
            transport,
            project_id: project_id.into(),
            state,
            abort: Mutex::new(None),
            last_style: Mutex::new(ResponseStyle::default()),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ConsumerState {
        self.state.borrow().clone()
    }

    /// Live view for rendering; updated on every event
    pub fn subscribe(&self) -> watch::Receiver<ConsumerState> {
        self.state.subscribe()
    }

    /// Abort the in-flight request, if any
    pub fn cancel(&self) {
        if let Some(handle) = self.abort_slot().take() {
            handle.abort();
        }
    }

    /// Replace the message list with the server's recent history
    pub async fn load_history(&self, limit: usize) -> Result<(), ClientError> {
        match self.transport.fetch_history(&self.project_id, limit).await {
            Ok(turns) => {
                self.state.send_modify(|s| s.messages = turns);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.state.send_modify(|s| s.error = Some(message));
                Err(e)
            }
        }
    }

    pub async fn send_message(
        &self,
        content: &str,
        images: Vec<String>,
        style: ResponseStyle,
    ) -> SendOutcome {
        if let Ok(mut last) = self.last_style.lock() {
            *last = style;
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let mut user_turn = ChatTurn::user(format!("{}-user", session_id), content);
        if !images.is_empty() {
            user_turn = user_turn.with_metadata(TurnMetadata {
                images: Some(images.clone()),
                ..Default::default()
            });
        }

        self.state.send_modify(|s| {
            s.messages.push(user_turn);
            s.loading = true;
            s.error = None;
            s.streaming_text.clear();
            s.sources.clear();
        });

        let body = ChatRequestBody {
            message: content.to_string(),
            session_id: session_id.clone(),
            context_style: Some(style),
            images: (!images.is_empty()).then_some(images),
        };

        let (handle, registration) = AbortHandle::new_pair();
        *self.abort_slot() = Some(handle);

        let mut guard: Option<ReaderGuard> = None;
        let result = Abortable::new(self.pump(&session_id, &body, &mut guard), registration).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_aborted) => {
                if let Some(guard) = guard.as_mut() {
                    guard.release().await;
                }
                self.state.send_modify(|s| s.finish());
                tracing::debug!(session_id = %session_id, "Chat request cancelled");
                SendOutcome::Cancelled
            }
        };

        self.abort_slot().take();
        outcome
    }

    /// Resubmit the most recent user turn. Any assistant turn created after
    /// it is dropped first, along with the user turn itself, which
    /// `send_message` appends again. `None` when there is nothing to retry.
    pub async fn retry_last_message(&self) -> Option<SendOutcome> {
        let mut retry: Option<(String, Vec<String>)> = None;

        self.state.send_modify(|s| {
            let Some(index) = s.messages.iter().rposition(|t| t.role == Role::User) else {
                return;
            };
            let user = s.messages.remove(index);
            s.messages.retain(|t| {
                !(t.role == Role::Assistant && t.created_at >= user.created_at)
            });
            s.error = None;
            retry = Some((user.content.clone(), user.images().to_vec()));
        });

        let (content, images) = retry?;
        let style = self.last_style.lock().map(|s| *s).unwrap_or_default();
        Some(self.send_message(&content, images, style).await)
    }

    fn abort_slot(&self) -> std::sync::MutexGuard<'_, Option<AbortHandle>> {
        self.abort.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn pump(
        &self,
        session_id: &str,
        body: &ChatRequestBody,
        slot: &mut Option<ReaderGuard>,
    ) -> SendOutcome {
        let reader = match self.transport.open_stream(&self.project_id, body).await {
            Ok(reader) => reader,
            Err(e) => {
                let message = match e {
                    ClientError::Rejected { message, .. } => message,
                    other => other.to_string(),
                };
                self.state.send_modify(|s| {
                    s.finish();
                    s.error = Some(message);
                });
                return SendOutcome::Failed;
            }
        };
        let guard = slot.insert(ReaderGuard::new(reader));
        let mut lines = CircularLineBuffer::with_capacity(8 * 1024);

        loop {
            let chunk = match guard.reader.read().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => {
                    if let Some(Ok(last)) = lines.take_remainder() {
                        if let Some(outcome) = self.handle_line(session_id, &last) {
                            guard.release().await;
                            return outcome;
                        }
                    }
                    guard.release().await;
                    self.state.send_modify(|s| {
                        s.finish();
                        s.error = Some(CONNECTION_CLOSED.to_string());
                    });
                    return SendOutcome::Closed;
                }
                Err(e) => {
                    guard.release().await;
                    let message = e.to_string();
                    self.state.send_modify(|s| {
                        s.finish();
                        s.error = Some(message);
                    });
                    return SendOutcome::Failed;
                }
            };

            lines.extend(&chunk);
            while let Some(line) = lines.next_line() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping undecodable line");
                        continue;
                    }
                };
                if let Some(outcome) = self.handle_line(session_id, &line) {
                    guard.release().await;
                    return outcome;
                }
            }
        }
    }

    /// Apply one line; `Some` when it carried a terminal event
    fn handle_line(&self, session_id: &str, line: &str) -> Option<SendOutcome> {
        if !line.starts_with(EVENT_PREFIX.trim_end()) {
            return None;
        }
        match StreamEvent::decode_line(line) {
            Ok(event) => self.dispatch(session_id, event),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed event");
                None
            }
        }
    }

    fn dispatch(&self, session_id: &str, event: StreamEvent) -> Option<SendOutcome> {
        match event {
            StreamEvent::Sources(passages) => {
                self.state.send_modify(|s| s.sources = passages);
                None
            }
            StreamEvent::Text(increment) => {
                self.state.send_modify(|s| s.streaming_text.push_str(&increment));
                None
            }
            StreamEvent::Image(_) => {
                tracing::trace!("Image event received");
                None
            }
            StreamEvent::Done => {
                self.state.send_modify(|s| {
                    let now = Utc::now();
                    let assistant = ChatTurn::assistant(
                        format!("{}-assistant", session_id),
                        std::mem::take(&mut s.streaming_text),
                    )
                    .with_created_at(now)
                    .with_metadata(TurnMetadata {
                        sources: Some(std::mem::take(&mut s.sources)),
                        timestamp: Some(now),
                        ..Default::default()
                    });
                    s.messages.push(assistant);
                    s.finish();
                });
                Some(SendOutcome::Completed)
            }
            StreamEvent::Error(message) => {
                self.state.send_modify(|s| {
                    s.finish();
                    s.error = Some(message);
                });
                Some(SendOutcome::Failed)
            }
        }
    }
}
