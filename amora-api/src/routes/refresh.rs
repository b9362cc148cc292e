use axum::extract::State;
use axum::Json;

use amora_shared::errors::AppResult;
use amora_shared::middleware::RefreshUser;
use amora_shared::types::{ApiResponse, TokenPair};

use crate::services::token_service;
use crate::AppState;

/// Token renewal. Gated by a refresh-scoped bearer token; access tokens
/// are rejected here just as refresh tokens are rejected everywhere else.
pub async fn refresh(
    RefreshUser(user): RefreshUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let pair = token_service::issue_token_pair(
        user.profile_id,
        &state.auth_keys,
        state.config.access_ttl_secs,
        state.config.refresh_ttl_secs,
    )?;

    Ok(Json(ApiResponse::ok(pair)))
}
