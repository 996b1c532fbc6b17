use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::ApiError, state::AppState};

/// Caller id forwarded by the upstream session layer in the configured
/// identity header. Missing or blank means 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CallerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = state.config.auth.identity_header.as_str();

        parts
            .headers
            .get(header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|caller| !caller.is_empty())
            .map(|caller| CallerIdentity(caller.to_string()))
            .ok_or(ApiError::Unauthenticated)
    }
}
