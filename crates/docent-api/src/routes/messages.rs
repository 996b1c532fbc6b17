use axum::{
    extract::{Path, Query, State},
    Json,
};
use docent_types::ChatTurn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    auth::CallerIdentity,
    error::{ApiError, ApiResult},
    state::AppState,
};

const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<ChatTurn>,
}

/// Recent turns of a project, oldest first
#[utoipa::path(
    get,
    path = "/projects/{project_id}/messages",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ("limit" = Option<usize>, Query, description = "Maximum number of turns (default: 50, max: 100)")
    ),
    responses(
        (status = 200, description = "Turns in chronological order"),
        (status = 401, description = "No caller identity"),
        (status = 403, description = "Project belongs to another caller"),
        (status = 404, description = "Project not found")
    ),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller_id): CallerIdentity,
    Path(project_id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Json<ListMessagesResponse>> {
    let project = state
        .persist
        .get_project(&project_id)
        .await?
        .ok_or_else(|| ApiError::ProjectNotFound(project_id.clone()))?;

    if !project.is_owned_by(&caller_id) {
        return Err(ApiError::Forbidden(project.id));
    }

    let limit = query.limit.min(MAX_LIMIT);
    let mut messages = state.persist.find_recent_turns(&project.id, limit).await?;
    messages.reverse();

    Ok(Json(ListMessagesResponse { messages }))
}
