#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docent_chat::{ChatSession, SessionConfig};
use docent_llm::{ChatClient, ChatRequest, EventStream, StreamEvent as ModelEvent};
use docent_persist::{InMemoryPersistenceClient, Project};
use docent_retrieval::{PassageRetriever, RetrievalError};
use docent_types::{ResponseStyle, RetrievedPassage, SessionRequest, StreamEvent};
use tokio::sync::mpsc;

pub const OWNER: &str = "alice";
pub const PROJECT: &str = "project-a";

/// What the fake model does when asked to stream
#[derive(Clone)]
pub enum Script {
    Reply(Vec<&'static str>),
    FailOpen(&'static str),
    FailAfter(Vec<&'static str>, &'static str),
    /// Yields the increments, then never finishes
    HangAfter(Vec<&'static str>),
    /// Plays the first script on the first call and the second afterwards
    Then(Box<Script>, Box<Script>),
}

impl Script {
    fn for_call(self, index: usize) -> Script {
        match self {
            Script::Then(first, rest) => {
                if index == 0 {
                    first.for_call(0)
                } else {
                    rest.for_call(index - 1)
                }
            }
            other => other,
        }
    }
}

pub struct ScriptedChatClient {
    script: Script,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatClient {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ChatRequest {
        self.requests.lock().unwrap().last().cloned().expect("model was not called")
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn chat_stream(&self, request: ChatRequest) -> anyhow::Result<EventStream> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };

        let script = self.script.clone().for_call(index);
        if let Script::FailOpen(reason) = &script {
            anyhow::bail!(*reason);
        }

        Ok(Box::pin(async_stream::stream! {
            match script {
                Script::Reply(parts) => {
                    for part in parts {
                        yield Ok(ModelEvent::Message { content: part.to_string() });
                    }
                    yield Ok(ModelEvent::Done { finish_reason: Some("stop".to_string()) });
                }
                Script::FailAfter(parts, reason) => {
                    for part in parts {
                        yield Ok(ModelEvent::Message { content: part.to_string() });
                    }
                    yield Err(anyhow::anyhow!(reason));
                }
                Script::HangAfter(parts) => {
                    for part in parts {
                        yield Ok(ModelEvent::Message { content: part.to_string() });
                    }
                    futures::future::pending::<()>().await;
                }
                Script::FailOpen(_) | Script::Then(..) => {}
            }
        }))
    }
}

/// Returns a fixed candidate list (or error) and records each call
pub struct FixedRetriever {
    result: Result<Vec<RetrievedPassage>, RetrievalError>,
    pub calls: Mutex<Vec<(String, String, usize)>>,
}

impl FixedRetriever {
    pub fn scored(scores: &[f32]) -> Self {
        let passages = scores
            .iter()
            .zip(1u32..)
            .map(|(score, id)| {
                RetrievedPassage::new(id, "policy.pdf", format!("passage {}", id), *score)
            })
            .collect();
        Self {
            result: Ok(passages),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RetrievalError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PassageRetriever for FixedRetriever {
    async fn retrieve(
        &self,
        query: &str,
        namespace: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), namespace.to_string(), k));
        self.result.clone()
    }
}

pub struct Harness {
    pub session: ChatSession,
    pub model: Arc<ScriptedChatClient>,
    pub retriever: Arc<dyn PassageRetriever>,
    pub store: Arc<InMemoryPersistenceClient>,
}

pub async fn harness(script: Script, retriever: Arc<dyn PassageRetriever>) -> Harness {
    harness_with_config(script, retriever, SessionConfig::default()).await
}

pub async fn harness_with_config(
    script: Script,
    retriever: Arc<dyn PassageRetriever>,
    config: SessionConfig,
) -> Harness {
    let model = Arc::new(ScriptedChatClient::new(script));
    let store = Arc::new(InMemoryPersistenceClient::new());
    store.insert_project(Project::new(PROJECT, OWNER, "Handbook")).await;

    let session = ChatSession::builder()
        .chat_client(model.clone())
        .retriever(retriever.clone())
        .persistence(store.clone())
        .config(config)
        .build()
        .unwrap();

    Harness {
        session,
        model,
        retriever,
        store,
    }
}

pub fn request(message: &str, session_id: &str) -> SessionRequest {
    SessionRequest {
        project_id: PROJECT.to_string(),
        message: message.to_string(),
        session_id: session_id.to_string(),
        style: ResponseStyle::Concise,
        images: Vec::new(),
    }
}

pub async fn collect(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}
