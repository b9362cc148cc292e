use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::middleware::AccessUser;
use amora_shared::types::ApiResponse;

use crate::models::{Message, MessageView, NewMessage};
use crate::schema::{messages, profiles};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub recipient: i32,
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// POST /messages — append-only; no edit or delete.
pub async fn send_message(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Message>>)> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let recipient_exists: bool = profiles::table
        .find(req.recipient)
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if !recipient_exists {
        return Err(AppError::new(ErrorCode::RecipientNotFound, "recipient not found"));
    }

    let message: Message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            sender: user.profile_id,
            recipient: req.recipient,
            body: req.body,
            attachments: req.attachments,
        })
        .get_result(&mut conn)?;

    let push_token: Option<Option<String>> = profiles::table
        .find(req.recipient)
        .select(profiles::push_token)
        .first(&mut conn)
        .optional()?;

    if let Some(Some(token)) = push_token {
        let push = state.push.clone();
        tokio::spawn(async move {
            if let Err(e) = push.send(&token, "New message", "").await {
                tracing::debug!(error = %e, "push dispatch failed");
            }
        });
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message))))
}

/// GET /messages/{peer} — both directions, ascending by timestamp,
/// attachments resolved to time-limited URLs.
pub async fn conversation(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    Path(peer): Path<i32>,
) -> AppResult<Json<ApiResponse<Vec<MessageView>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let history = messages::table
        .filter(
            messages::sender
                .eq(user.profile_id)
                .and(messages::recipient.eq(peer))
                .or(messages::sender.eq(peer).and(messages::recipient.eq(user.profile_id))),
        )
        .order(messages::created_at.asc())
        .load::<Message>(&mut conn)?;

    let mut views = Vec::with_capacity(history.len());
    for message in history {
        let mut attachments = Vec::with_capacity(message.attachments.len());
        for key in &message.attachments {
            match state
                .storage
                .presigned_url(&state.storage.gallery_bucket, key, state.config.presign_ttl_secs)
                .await
            {
                Ok(url) => attachments.push(url),
                Err(e) => tracing::warn!(error = %e, key = %key, "attachment presign failed"),
            }
        }

        views.push(MessageView {
            id: message.id,
            sender: message.sender,
            recipient: message.recipient,
            body: message.body,
            attachments,
            created_at: message.created_at,
        });
    }

    Ok(Json(ApiResponse::ok(views)))
}
