use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    config::{IndexBackend, PersistenceBackend},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Reports which backends the server was started with
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = HashMap::new();

    let persistence = match state.config.persistence.backend {
        PersistenceBackend::Memory => "memory",
        PersistenceBackend::Mongodb => "mongodb",
    };
    services.insert("persistence".to_string(), persistence.to_string());

    let index = match state.config.retrieval.backend {
        IndexBackend::Memory => "memory",
        IndexBackend::Pinecone => "pinecone",
    };
    services.insert("vector_index".to_string(), index.to_string());
    services.insert("model".to_string(), state.session.config().model.clone());

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
