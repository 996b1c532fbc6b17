use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use docent_llm::{ChatClient, ChatOptions, ChatRequest, Message, StreamEvent as ModelEvent};
use docent_persist::{PersistenceClient, Project};
use docent_retrieval::{PassageRetriever, RelevanceFilter};
use docent_types::{ChatTurn, RetrievedPassage, SessionRequest, StreamEvent, TurnMetadata};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout_at;
use tracing::Instrument;

use crate::builder::ChatSessionBuilder;
use crate::composer::PromptComposer;
use crate::config::SessionConfig;
use crate::error::{SessionRejection, StreamFailure};
use crate::phase::{SessionOutcome, SessionPhase};
use crate::tokens::TokenCounter;

const EVENT_BUFFER: usize = 1000;

/// A request that passed validation. Only `ChatSession::open` creates one,
/// so holding it means the stream may be opened.
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub request: SessionRequest,
    pub project: Project,
    pub caller_id: String,
    pub received_at: DateTime<Utc>,
}

/// Drives one grounded answer per request: retrieve, filter, compose,
/// stream, persist. Each run is an independent task with no shared
/// mutable state.
pub struct ChatSession {
    chat_client: Arc<dyn ChatClient>,
    retriever: Arc<dyn PassageRetriever>,
    persistence: Arc<dyn PersistenceClient>,
    tokens: Arc<TokenCounter>,
    config: Arc<SessionConfig>,
}

/// Everything a spawned run needs, cloned out of the session
struct Run {
    chat_client: Arc<dyn ChatClient>,
    retriever: Arc<dyn PassageRetriever>,
    persistence: Arc<dyn PersistenceClient>,
    tokens: Arc<TokenCounter>,
    config: Arc<SessionConfig>,
    composer: PromptComposer,
    filter: RelevanceFilter,
}

enum Streamed {
    Complete(String),
    Cancelled,
}

impl ChatSession {
    pub(crate) fn new(
        chat_client: Arc<dyn ChatClient>,
        retriever: Arc<dyn PassageRetriever>,
        persistence: Arc<dyn PersistenceClient>,
        tokens: Arc<TokenCounter>,
        config: SessionConfig,
    ) -> Self {
        Self {
            chat_client,
            retriever,
            persistence,
            tokens,
            config: Arc::new(config),
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> ChatSessionBuilder {
        ChatSessionBuilder::new()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Pre-stream checks. A rejection here means no event stream is opened.
    pub async fn open(
        &self,
        caller_id: &str,
        request: SessionRequest,
    ) -> Result<ValidatedSession, SessionRejection> {
        let received_at = Utc::now();

        if caller_id.trim().is_empty() {
            return Err(SessionRejection::Unauthenticated);
        }

        let message = request.message.trim().to_string();
        if message.is_empty() {
            return Err(SessionRejection::EmptyMessage);
        }
        if request.session_id.trim().is_empty() {
            return Err(SessionRejection::InvalidRequest(
                "sessionId must not be empty".to_string(),
            ));
        }

        let project = self
            .persistence
            .get_project(&request.project_id)
            .await?
            .ok_or_else(|| SessionRejection::ProjectNotFound(request.project_id.clone()))?;

        if !project.is_owned_by(caller_id) {
            tracing::warn!(
                project_id = %project.id,
                caller_id = %caller_id,
                "Caller does not own project"
            );
            return Err(SessionRejection::Forbidden(project.id));
        }

        tracing::debug!(
            project_id = %project.id,
            session_id = %request.session_id,
            phase = %SessionPhase::Validating,
            "Session validated"
        );

        Ok(ValidatedSession {
            request: SessionRequest { message, ..request },
            project,
            caller_id: caller_id.to_string(),
            received_at,
        })
    }

    /// Spawn execution in background, return event receiver.
    /// Dropping the receiver cancels the run.
    pub fn spawn_run(&self, session: ValidatedSession) -> mpsc::Receiver<StreamEvent> {
        let (rx, _handle) = self.spawn_tracked(session);
        rx
    }

    /// Like `spawn_run`, also returning a handle that resolves to the outcome
    pub fn spawn_tracked(
        &self,
        session: ValidatedSession,
    ) -> (mpsc::Receiver<StreamEvent>, JoinHandle<SessionOutcome>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let run = Run {
            chat_client: Arc::clone(&self.chat_client),
            retriever: Arc::clone(&self.retriever),
            persistence: Arc::clone(&self.persistence),
            tokens: Arc::clone(&self.tokens),
            config: Arc::clone(&self.config),
            composer: PromptComposer::new(self.config.guideline.clone(), self.config.history_window),
            filter: RelevanceFilter::new(self.config.relevance_threshold),
        };

        let span = tracing::info_span!(
            "chat_session",
            project_id = %session.project.id,
            session_id = %session.request.session_id
        );

        let handle = tokio::spawn(
            async move {
                let start = Instant::now();
                let outcome = run.execute(&session, &tx).await;

                if let SessionOutcome::Failed(failure) = &outcome {
                    let _ = tx.send(StreamEvent::Error(failure.to_string())).await;
                    tracing::warn!(error = %failure, "Chat session failed");
                }

                tracing::info!(
                    outcome = outcome.label(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Chat session finished"
                );
                outcome
            }
            .instrument(span),
        );

        (rx, handle)
    }
}

impl Run {
    async fn execute(&self, session: &ValidatedSession, tx: &mpsc::Sender<StreamEvent>) -> SessionOutcome {
        let request = &session.request;
        let project = &session.project;

        tracing::debug!(phase = %SessionPhase::Retrieving, namespace = %project.namespace(), "Retrieving passages");
        let candidates = match self
            .retriever
            .retrieve(&request.message, project.namespace(), self.config.top_k)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => return SessionOutcome::Failed(e.into()),
        };

        let sources = self.filter.apply(&candidates);
        tracing::debug!(
            phase = %SessionPhase::Filtering,
            candidates = candidates.len(),
            kept = sources.len(),
            threshold = self.filter.threshold(),
            "Filtered passages"
        );

        let history = match self
            .persistence
            .find_recent_turns(&project.id, self.config.history_window)
            .await
        {
            Ok(turns) => self.composer.history_window(turns),
            Err(e) => {
                tracing::warn!(error = %e, "History unavailable, composing without it");
                Vec::new()
            }
        };
        let messages = self.composer.compose(
            request.style,
            &sources,
            &history,
            &request.message,
            &request.images,
        );
        tracing::debug!(
            phase = %SessionPhase::Composing,
            messages = messages.len(),
            history = history.len(),
            "Composed prompt"
        );

        if tx.send(StreamEvent::Sources(sources.clone())).await.is_err() {
            return SessionOutcome::Cancelled;
        }

        tracing::debug!(phase = %SessionPhase::Streaming, model = %self.config.model, "Streaming answer");
        let answer = match self.stream_answer(messages, tx).await {
            Ok(Streamed::Complete(answer)) => answer,
            Ok(Streamed::Cancelled) => return SessionOutcome::Cancelled,
            Err(failure) => return SessionOutcome::Failed(failure),
        };

        tracing::debug!(phase = %SessionPhase::Persisting, chars = answer.len(), "Persisting exchange");
        let persisted = self.persist(session, answer, sources).await;

        if tx.send(StreamEvent::Done).await.is_err() {
            tracing::debug!("Receiver dropped before done");
        }
        SessionOutcome::Completed { persisted }
    }

    /// Forward every increment in order until the model finishes, the
    /// receiver goes away or the deadline passes.
    async fn stream_answer(
        &self,
        messages: Vec<Message>,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<Streamed, StreamFailure> {
        let limit = self.config.stream_timeout;
        let deadline = tokio::time::Instant::now() + limit;

        let mut options = ChatOptions::new();
        if let Some(temp) = self.config.temperature {
            options = options.temperature(temp);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            options = options.max_tokens(max_tokens);
        }
        let request = ChatRequest::new(self.config.model.clone(), messages).with_options(options);

        let mut stream = tokio::select! {
            biased;
            _ = tx.closed() => return Ok(Streamed::Cancelled),
            opened = timeout_at(deadline, self.chat_client.chat_stream(request)) => match opened {
                Err(_) => return Err(StreamFailure::Timeout(limit)),
                Ok(Err(e)) => return Err(StreamFailure::ModelUnavailable(format!("{:#}", e))),
                Ok(Ok(stream)) => stream,
            },
        };

        let mut answer = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = tx.closed() => return Ok(Streamed::Cancelled),
                next = timeout_at(deadline, stream.next()) => next,
            };

            match next {
                Err(_) => return Err(StreamFailure::Timeout(limit)),
                Ok(None) | Ok(Some(Ok(ModelEvent::Done { .. }))) => break,
                Ok(Some(Ok(ModelEvent::Message { content }))) => {
                    answer.push_str(&content);
                    if tx.send(StreamEvent::Text(content)).await.is_err() {
                        return Ok(Streamed::Cancelled);
                    }
                }
                Ok(Some(Err(e))) => {
                    let detail = format!("{:#}", e);
                    return Err(if answer.is_empty() {
                        StreamFailure::ModelUnavailable(detail)
                    } else {
                        StreamFailure::ModelInterrupted(detail)
                    });
                }
            }
        }

        Ok(Streamed::Complete(answer))
    }

    /// Write the user/assistant pair. Failures are logged, never surfaced.
    async fn persist(
        &self,
        session: &ValidatedSession,
        answer: String,
        sources: Vec<RetrievedPassage>,
    ) -> bool {
        let request = &session.request;
        let now = Utc::now();

        let mut user_turn = ChatTurn::user(format!("{}-user", request.session_id), &request.message)
            .with_created_at(session.received_at);
        if !request.images.is_empty() {
            user_turn = user_turn.with_metadata(TurnMetadata {
                images: Some(request.images.clone()),
                timestamp: Some(session.received_at),
                ..Default::default()
            });
        }

        let token_count = self.tokens.count(&answer);
        let assistant_turn = ChatTurn::assistant(format!("{}-assistant", request.session_id), answer)
            .with_created_at(now)
            .with_metadata(TurnMetadata {
                sources: Some(sources),
                timestamp: Some(now),
                token_count: Some(token_count),
                ..Default::default()
            });

        match self
            .persistence
            .create_turns(&session.project.id, vec![user_turn, assistant_turn])
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist chat turns");
                false
            }
        }
    }
}
