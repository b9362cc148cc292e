use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;

use amora_shared::errors::{AppError, AppResult};
use amora_shared::middleware::AccessUser;
use amora_shared::types::ApiResponse;

use crate::models::{DislikeEntry, LikeEntry};
use crate::schema::profiles;
use crate::services::affinity::{self, AffinityOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AffinityRequest {
    pub target: i32,
}

/// POST /like — 201 liked, 200 match, 202 toggled off.
pub async fn like(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    Json(req): Json<AffinityRequest>,
) -> AppResult<Response> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let outcome = affinity::set_like(&mut conn, user.profile_id, req.target)?;

    match outcome {
        AffinityOutcome::Liked => {
            notify(&state, &mut conn, req.target, "Someone likes you");
        }
        AffinityOutcome::Matched => {
            notify(&state, &mut conn, req.target, "You have a new match");
            notify(&state, &mut conn, user.profile_id, "You have a new match");
        }
        _ => {}
    }

    Ok((outcome.status_code(), Json(ApiResponse::ok(outcome))).into_response())
}

/// POST /dislike — 201 disliked, 202 toggled off.
pub async fn dislike(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    Json(req): Json<AffinityRequest>,
) -> AppResult<Response> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let outcome = affinity::set_dislike(&mut conn, user.profile_id, req.target)?;

    Ok((outcome.status_code(), Json(ApiResponse::ok(outcome))).into_response())
}

/// GET /likes — who likes me.
pub async fn list_likes(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<LikeEntry>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let entries = affinity::list_likes(&mut conn, user.profile_id)?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// GET /dislikes — outstanding dislikes issued by the caller.
pub async fn list_dislikes(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<DislikeEntry>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let entries = affinity::list_dislikes(&mut conn, user.profile_id)?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// Best-effort push dispatch to a profile's registered device token.
fn notify(state: &AppState, conn: &mut PgConnection, profile_id: i32, title: &str) {
    let token: Option<Option<String>> = profiles::table
        .find(profile_id)
        .select(profiles::push_token)
        .first(conn)
        .optional()
        .unwrap_or(None);

    if let Some(Some(token)) = token {
        let push = state.push.clone();
        let title = title.to_string();
        tokio::spawn(async move {
            if let Err(e) = push.send(&token, &title, "").await {
                tracing::debug!(error = %e, "push dispatch failed");
            }
        });
    }
}
