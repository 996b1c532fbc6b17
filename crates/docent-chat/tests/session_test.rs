mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use docent_chat::{SessionConfig, SessionOutcome, SessionRejection};
use docent_llm::{Content, EmbeddingClient, EmbeddingRequest};
use docent_persist::{PersistenceClient, Project};
use docent_retrieval::{InMemoryVectorIndex, RetrievalError, Retriever};
use docent_types::{ChatTurn, Role, StreamEvent};

fn texts(events: &[StreamEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Text(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_successful_stream_orders_events_and_persists_pair() {
    let h = harness(
        Script::Reply(vec!["Hel", "lo"]),
        Arc::new(FixedRetriever::scored(&[0.91, 0.60])),
    )
    .await;

    let validated = h
        .session
        .open(OWNER, request("  What is the refund policy?  ", "s1"))
        .await
        .unwrap();
    let events = collect(h.session.spawn_run(validated)).await;

    assert_eq!(events.len(), 4);
    match &events[0] {
        StreamEvent::Sources(sources) => {
            assert_eq!(sources.len(), 1);
            assert_eq!(sources[0].score, 0.91);
        }
        other => panic!("expected sources first, got {:?}", other),
    }
    assert_eq!(texts(&events), vec!["Hel", "lo"]);
    assert_eq!(events[3], StreamEvent::Done);

    let turns = h.store.turns(PROJECT).await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].id, "s1-user");
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "What is the refund policy?");
    assert_eq!(turns[1].id, "s1-assistant");
    assert_eq!(turns[1].content, texts(&events).concat());

    let metadata = turns[1].metadata.as_ref().unwrap();
    assert_eq!(metadata.sources.as_ref().unwrap().len(), 1);
    assert!(metadata.timestamp.is_some());
    assert!(metadata.token_count.unwrap() > 0);
}

#[tokio::test]
async fn test_retriever_gets_trimmed_message_namespace_and_top_k() {
    let retriever = Arc::new(FixedRetriever::scored(&[]));
    let h = harness(Script::Reply(vec!["ok"]), retriever.clone()).await;

    let validated = h.session.open(OWNER, request("  refunds? ", "s1")).await.unwrap();
    collect(h.session.spawn_run(validated)).await;

    let calls = retriever.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![("refunds?".to_string(), PROJECT.to_string(), 4)]);
}

#[tokio::test]
async fn test_all_scores_below_threshold_answers_ungrounded() {
    let h = harness(
        Script::Reply(vec!["general answer"]),
        Arc::new(FixedRetriever::scored(&[0.5, 0.3])),
    )
    .await;

    let validated = h.session.open(OWNER, request("hi", "s1")).await.unwrap();
    let events = collect(h.session.spawn_run(validated)).await;

    assert_eq!(events[0], StreamEvent::Sources(vec![]));
    assert_eq!(events[0].to_json(), r#"{"type":"sources","content":"[]"}"#);
    assert_eq!(events.last(), Some(&StreamEvent::Done));

    let sent = h.model.last_request();
    assert_eq!(sent.messages.len(), 2);
    assert_eq!(sent.messages[0].role(), "system");
    assert_eq!(sent.messages[1].role(), "user");
}

#[tokio::test]
async fn test_grounded_prompt_includes_context_and_history() {
    let h = harness(
        Script::Reply(vec!["answer"]),
        Arc::new(FixedRetriever::scored(&[0.95])),
    )
    .await;
    let earlier = chrono::Utc::now() - chrono::Duration::minutes(5);
    h.store
        .create_turns(
            PROJECT,
            vec![
                ChatTurn::user("old-user", "first question").with_created_at(earlier),
                ChatTurn::assistant("old-assistant", "first answer")
                    .with_created_at(earlier + chrono::Duration::seconds(1)),
            ],
        )
        .await
        .unwrap();

    let validated = h.session.open(OWNER, request("follow up", "s2")).await.unwrap();
    collect(h.session.spawn_run(validated)).await;

    let sent = h.model.last_request();
    let roles: Vec<_> = sent.messages.iter().map(|m| m.role().to_string()).collect();
    assert_eq!(roles, vec!["system", "system", "user", "assistant", "user"]);
    assert!(sent.messages[1].content().text_parts().contains("[1] passage 1"));
    assert_eq!(sent.messages[2].content().as_text(), Some("first question"));
    assert_eq!(sent.messages[4].content().as_text(), Some("follow up"));
}

#[tokio::test]
async fn test_retrieval_unavailable_emits_single_error() {
    let h = harness(
        Script::Reply(vec!["never"]),
        Arc::new(FixedRetriever::failing(RetrievalError::Unavailable("index down".into()))),
    )
    .await;

    let validated = h.session.open(OWNER, request("hi", "s1")).await.unwrap();
    let events = collect(h.session.spawn_run(validated)).await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Error(message) => assert!(message.contains("index down")),
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(h.model.calls(), 0);
    assert_eq!(h.store.write_calls(), 0);
}

#[tokio::test]
async fn test_model_failure_before_first_increment() {
    let h = harness(
        Script::FailOpen("model overloaded"),
        Arc::new(FixedRetriever::scored(&[0.9])),
    )
    .await;

    let validated = h.session.open(OWNER, request("hi", "s1")).await.unwrap();
    let events = collect(h.session.spawn_run(validated)).await;

    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], StreamEvent::Sources(_)));
    match &events[1] {
        StreamEvent::Error(message) => assert!(message.contains("model overloaded")),
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(h.store.write_calls(), 0);
}

#[tokio::test]
async fn test_model_failure_mid_stream_keeps_partial_text_and_skips_persistence() {
    let h = harness(
        Script::FailAfter(vec!["Hel"], "connection reset"),
        Arc::new(FixedRetriever::scored(&[0.9])),
    )
    .await;

    let validated = h.session.open(OWNER, request("hi", "s1")).await.unwrap();
    let events = collect(h.session.spawn_run(validated)).await;

    assert_eq!(texts(&events), vec!["Hel"]);
    assert!(matches!(events.last(), Some(StreamEvent::Error(_))));
    assert!(!events.contains(&StreamEvent::Done));
    assert_eq!(h.store.write_calls(), 0);
}

#[tokio::test]
async fn test_persistence_failure_is_swallowed() {
    let h = harness(
        Script::Reply(vec!["Hel", "lo"]),
        Arc::new(FixedRetriever::scored(&[0.9])),
    )
    .await;
    h.store.fail_writes(true);

    let validated = h.session.open(OWNER, request("hi", "s1")).await.unwrap();
    let (rx, handle) = h.session.spawn_tracked(validated);
    let events = collect(rx).await;

    assert_eq!(events.last(), Some(&StreamEvent::Done));
    assert!(!events.iter().any(|e| matches!(e, StreamEvent::Error(_))));
    assert_eq!(h.store.write_calls(), 1);
    assert!(matches!(handle.await.unwrap(), SessionOutcome::Completed { persisted: false }));
}

#[tokio::test]
async fn test_cancellation_mid_stream_stops_without_done_or_persistence() {
    let h = harness(
        Script::HangAfter(vec!["Hel"]),
        Arc::new(FixedRetriever::scored(&[0.9])),
    )
    .await;

    let validated = h.session.open(OWNER, request("hi", "s1")).await.unwrap();
    let (mut rx, handle) = h.session.spawn_tracked(validated);

    assert!(matches!(rx.recv().await, Some(StreamEvent::Sources(_))));
    assert_eq!(rx.recv().await, Some(StreamEvent::Text("Hel".into())));
    drop(rx);

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run should stop after the receiver is dropped")
        .unwrap();
    assert!(matches!(outcome, SessionOutcome::Cancelled));
    assert_eq!(h.store.write_calls(), 0);
}

#[tokio::test]
async fn test_abort_after_sources_before_text() {
    let h = harness(
        Script::HangAfter(vec![]),
        Arc::new(FixedRetriever::scored(&[0.9])),
    )
    .await;

    let validated = h.session.open(OWNER, request("hi", "s1")).await.unwrap();
    let (mut rx, handle) = h.session.spawn_tracked(validated);
    assert!(matches!(rx.recv().await, Some(StreamEvent::Sources(_))));
    drop(rx);

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, SessionOutcome::Cancelled));
    assert!(h.store.turns(PROJECT).await.is_empty());
}

#[tokio::test]
async fn test_fresh_request_after_abort_is_unaffected() {
    let script = Script::Then(
        Box::new(Script::HangAfter(vec!["Hel"])),
        Box::new(Script::Reply(vec!["Hello"])),
    );
    let h = harness(script, Arc::new(FixedRetriever::scored(&[0.9]))).await;

    let validated = h.session.open(OWNER, request("hi", "s1")).await.unwrap();
    let (mut rx, handle) = h.session.spawn_tracked(validated);
    rx.recv().await;
    drop(rx);
    handle.await.unwrap();
    assert_eq!(h.store.write_calls(), 0);

    let validated = h.session.open(OWNER, request("hi", "s2")).await.unwrap();
    let events = collect(h.session.spawn_run(validated)).await;
    assert_eq!(texts(&events), vec!["Hello"]);
    assert_eq!(events.last(), Some(&StreamEvent::Done));
    assert_eq!(h.model.calls(), 2);

    let ids: Vec<_> = h
        .store
        .turns(PROJECT)
        .await
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["s2-user", "s2-assistant"]);
}

#[tokio::test]
async fn test_stream_deadline_emits_error_and_skips_persistence() {
    let config = SessionConfig::default().with_stream_timeout(Duration::from_millis(50));
    let h = harness_with_config(
        Script::HangAfter(vec!["Hel"]),
        Arc::new(FixedRetriever::scored(&[0.9])),
        config,
    )
    .await;

    let validated = h.session.open(OWNER, request("hi", "s1")).await.unwrap();
    let events = collect(h.session.spawn_run(validated)).await;

    assert_eq!(texts(&events), vec!["Hel"]);
    match events.last() {
        Some(StreamEvent::Error(message)) => assert!(message.contains("timed out")),
        other => panic!("expected timeout error, got {:?}", other),
    }
    assert_eq!(h.store.write_calls(), 0);
}

#[tokio::test]
async fn test_images_reach_model_and_user_turn() {
    let h = harness(Script::Reply(vec!["a cat"]), Arc::new(FixedRetriever::scored(&[]))).await;
    let mut req = request("what is this?", "s1");
    req.images = vec!["data:image/png;base64,AAAA".to_string()];

    let validated = h.session.open(OWNER, req).await.unwrap();
    collect(h.session.spawn_run(validated)).await;

    let sent = h.model.last_request();
    assert!(matches!(sent.messages.last().unwrap().content(), Content::Parts(_)));
    let turns = h.store.turns(PROJECT).await;
    assert_eq!(turns[0].images(), &["data:image/png;base64,AAAA".to_string()]);
}

#[tokio::test]
async fn test_open_rejections() {
    let h = harness(Script::Reply(vec![]), Arc::new(FixedRetriever::scored(&[]))).await;
    h.store.insert_project(Project::new("project-b", "bob", "Other")).await;

    assert!(matches!(
        h.session.open("", request("hi", "s")).await,
        Err(SessionRejection::Unauthenticated)
    ));
    assert!(matches!(
        h.session.open(OWNER, request("   ", "s")).await,
        Err(SessionRejection::EmptyMessage)
    ));
    assert!(matches!(
        h.session.open(OWNER, request("hi", "")).await,
        Err(SessionRejection::InvalidRequest(_))
    ));

    let mut missing = request("hi", "s");
    missing.project_id = "nope".to_string();
    assert!(matches!(
        h.session.open(OWNER, missing).await,
        Err(SessionRejection::ProjectNotFound(_))
    ));

    let mut foreign = request("hi", "s");
    foreign.project_id = "project-b".to_string();
    assert!(matches!(
        h.session.open(OWNER, foreign).await,
        Err(SessionRejection::Forbidden(_))
    ));
    assert_eq!(h.model.calls(), 0);
}

/// Maps any text containing "refund" onto the same axis
struct KeywordEmbedder;

#[async_trait::async_trait]
impl EmbeddingClient for KeywordEmbedder {
    async fn embed(&self, request: EmbeddingRequest) -> anyhow::Result<Vec<f32>> {
        if request.input.to_lowercase().contains("refund") {
            Ok(vec![1.0, 0.0])
        } else {
            Ok(vec![0.0, 1.0])
        }
    }
}

#[tokio::test]
async fn test_sources_never_include_other_project_passages() {
    let index = Arc::new(InMemoryVectorIndex::new());
    let meta = serde_json::Map::new();
    index
        .upsert(PROJECT, "a1", vec![1.0, 0.0], "Project A refunds: 30 days", meta.clone())
        .await;
    index
        .upsert("project-b", "b1", vec![1.0, 0.0], "Project B refunds: none", meta)
        .await;
    let retriever = Arc::new(Retriever::new(Arc::new(KeywordEmbedder), index, "embed"));

    let h = harness(Script::Reply(vec!["30 days"]), retriever).await;
    let validated = h
        .session
        .open(OWNER, request("What is the refund policy?", "s1"))
        .await
        .unwrap();
    let events = collect(h.session.spawn_run(validated)).await;

    match &events[0] {
        StreamEvent::Sources(sources) => {
            assert_eq!(sources.len(), 1);
            assert!(sources[0].page_content.starts_with("Project A"));
        }
        other => panic!("expected sources, got {:?}", other),
    }
    let prompt = h.model.last_request().messages[1].content().text_parts();
    assert!(!prompt.contains("Project B"));
}
