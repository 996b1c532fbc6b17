use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use docent_types::{ChatRequestBody, SessionRequest};
use futures::stream::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    auth::CallerIdentity,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Ask a question about a project's documents and stream the grounded answer
///
/// Every frame is `data: {"type": ..., "content": ...}`: one `sources` frame,
/// then `text` increments, then exactly one `done` or `error`.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/chat",
    params(
        ("project_id" = String, Path, description = "Project ID")
    ),
    request_body(
        content = serde_json::Value,
        description = "{ message, sessionId, contextStyle?: concise|detailed|technical, images?: [url] }",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream"),
        (status = 400, description = "Empty message or malformed body"),
        (status = 401, description = "No caller identity"),
        (status = 403, description = "Project belongs to another caller"),
        (status = 404, description = "Project not found")
    ),
    tag = "chat"
)]
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller_id): CallerIdentity,
    Path(project_id): Path<String>,
    body: Result<Json<ChatRequestBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let request = SessionRequest::from_body(project_id, body);
    let validated = state.session.open(&caller_id, request).await?;

    // Dropping this stream (client disconnect) drops the receiver, which
    // stops the run before persistence
    let receiver = state.session.spawn_run(validated);
    let events = ReceiverStream::new(receiver)
        .map(|event| Ok::<Event, Infallible>(Event::default().data(event.to_json())));

    let headers = [
        (header::CACHE_CONTROL, "no-cache"),
        (header::HeaderName::from_static("x-accel-buffering"), "no"),
    ];

    Ok((headers, Sse::new(events).keep_alive(KeepAlive::default())))
}
