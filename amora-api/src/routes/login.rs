use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::{ApiResponse, TokenPair};

use crate::models::Auth;
use crate::schema::auth;
use crate::services::{credential_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let account: Auth = auth::table
        .filter(auth::email.eq(req.email.to_lowercase()))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"))?;

    let valid = credential_service::verify_password(&req.password, &account.password_hash)?;
    if !valid {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"));
    }

    if !account.verified {
        return Err(AppError::new(ErrorCode::EmailNotVerified, "email not verified"));
    }

    let pair = token_service::issue_token_pair(
        account.profile_id,
        &state.auth_keys,
        state.config.access_ttl_secs,
        state.config.refresh_ttl_secs,
    )?;

    tracing::info!(profile_id = account.profile_id, "logged in");

    Ok(Json(ApiResponse::ok(pair)))
}
