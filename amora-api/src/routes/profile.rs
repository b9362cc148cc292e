use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::middleware::AccessUser;
use amora_shared::types::ApiResponse;

use crate::models::{Auth, Dislike, Like, Message, Profile, ProfileView, UpdateProfile, UpdateProfileRequest};
use crate::schema::{auth, dislikes, likes, messages, profiles};
use crate::services::{affinity, credential_service, media};
use crate::AppState;

async fn profile_view(state: &AppState, profile: &Profile) -> ProfileView {
    let avatar = if profile.avatar {
        state
            .storage
            .presigned_url(
                &state.storage.avatars_bucket,
                &media::avatar_key(profile.id),
                state.config.presign_ttl_secs,
            )
            .await
            .ok()
    } else {
        None
    };

    ProfileView {
        id: profile.id,
        name: profile.name.clone(),
        age: credential_service::age_today(profile.birth),
        sex: profile.sex.clone(),
        about: profile.about.clone(),
        status: profile.status.clone(),
        avatar,
    }
}

fn load_profile(conn: &mut PgConnection, id: i32) -> AppResult<Profile> {
    profiles::table
        .find(id)
        .first::<Profile>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
}

/// GET /profile — own profile.
pub async fn get_own(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let profile = load_profile(&mut conn, user.profile_id)?;
    Ok(Json(ApiResponse::ok(profile_view(&state, &profile).await)))
}

/// GET /profile/{id}.
pub async fn get_by_id(
    AccessUser(_user): AccessUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let profile = load_profile(&mut conn, id)?;
    Ok(Json(ApiResponse::ok(profile_view(&state, &profile).await)))
}

/// PATCH /profile — only supplied fields are written.
pub async fn update(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    // geolocation is both-or-neither
    if req.latitude.is_some() != req.longitude.is_some() {
        return Err(AppError::new(
            ErrorCode::IncompleteCoordinates,
            "latitude and longitude must be supplied together",
        ));
    }

    let changes = UpdateProfile {
        name: req.name,
        status: req.status,
        about: req.about,
        latitude: req.latitude,
        longitude: req.longitude,
        push_token: req.push_token,
    };

    if changes.name.is_none()
        && changes.status.is_none()
        && changes.about.is_none()
        && changes.latitude.is_none()
        && changes.push_token.is_none()
    {
        return Err(AppError::bad_request("no fields to update"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated: Profile = diesel::update(profiles::table.find(user.profile_id))
        .set(&changes)
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(profile_view(&state, &updated).await)))
}

/// DELETE /profile — cascading account deletion.
///
/// Profile, auth row, and every like/dislike edge touching the account go
/// in one transaction; stored objects are cleaned up best-effort after.
pub async fn delete_account(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = conn.transaction(|conn| {
        let profile = profiles::table
            .find(user.profile_id)
            .for_update()
            .first::<Profile>(conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

        affinity::delete_edges_for(conn, profile.id)?;
        diesel::delete(auth::table.filter(auth::profile_id.eq(profile.id))).execute(conn)?;
        diesel::delete(profiles::table.find(profile.id)).execute(conn)?;

        Ok::<_, AppError>(profile)
    })?;

    let storage = state.storage.clone();
    tokio::spawn(async move {
        if profile.avatar {
            let key = media::avatar_key(profile.id);
            if let Err(e) = storage.delete(&storage.avatars_bucket, &key).await {
                tracing::warn!(error = %e, "avatar cleanup failed");
            }
        }
        for key in &profile.images {
            if let Err(e) = storage.delete(&storage.gallery_bucket, key).await {
                tracing::warn!(error = %e, key = %key, "gallery cleanup failed");
            }
        }
    });

    tracing::info!(profile_id = user.profile_id, "account deleted");

    Ok(Json(ApiResponse::ok("account deleted")))
}

// --- GDPR export ---

#[derive(Debug, Deserialize)]
pub struct GdprQuery {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct GdprProfile {
    pub id: i32,
    pub name: String,
    pub birth: chrono::NaiveDate,
    pub sex: String,
    pub about: String,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub email: String,
    pub verified: bool,
}

#[derive(Debug, Serialize)]
pub struct GdprExport {
    pub profile: GdprProfile,
    pub likes_sent: Vec<Like>,
    pub likes_received: Vec<Like>,
    pub dislikes_sent: Vec<Dislike>,
    pub messages: Vec<Message>,
}

/// GET /gdpr — full data export, password-reverified.
pub async fn gdpr_export(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    Query(query): Query<GdprQuery>,
) -> AppResult<Json<ApiResponse<GdprExport>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let account: Auth = auth::table
        .filter(auth::profile_id.eq(user.profile_id))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::InvalidCredentials, "account not found"))?;

    if !credential_service::verify_password(&query.password, &account.password_hash)? {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "wrong password"));
    }

    let profile = load_profile(&mut conn, user.profile_id)?;

    let likes_sent = likes::table
        .filter(likes::initiator.eq(profile.id))
        .load::<Like>(&mut conn)?;
    let likes_received = likes::table
        .filter(likes::target.eq(profile.id))
        .load::<Like>(&mut conn)?;
    let dislikes_sent = dislikes::table
        .filter(dislikes::initiator.eq(profile.id))
        .load::<Dislike>(&mut conn)?;
    let message_history = messages::table
        .filter(messages::sender.eq(profile.id).or(messages::recipient.eq(profile.id)))
        .order(messages::created_at.asc())
        .load::<Message>(&mut conn)?;

    let export = GdprExport {
        profile: GdprProfile {
            id: profile.id,
            name: profile.name,
            birth: profile.birth,
            sex: profile.sex,
            about: profile.about,
            status: profile.status,
            latitude: profile.latitude,
            longitude: profile.longitude,
            images: profile.images,
            email: account.email.clone(),
            verified: account.verified,
        },
        likes_sent,
        likes_received,
        dislikes_sent,
        messages: message_history,
    };

    if let Ok(json) = serde_json::to_string_pretty(&export) {
        let mailer = state.email.clone();
        let to = account.email;
        tokio::spawn(async move {
            if let Err(e) = mailer.send_gdpr_export(&to, &json).await {
                tracing::warn!(error = %e, "gdpr export mail failed");
            }
        });
    }

    Ok(Json(ApiResponse::ok(export)))
}
