use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::middleware::AccessUser;
use amora_shared::types::ApiResponse;

use crate::models::Profile;
use crate::schema::profiles;
use crate::services::media;
use crate::AppState;

async fn read_image_bytes(multipart: &mut Multipart) -> AppResult<Vec<u8>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::UploadFailed, format!("failed to read multipart: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::UploadFailed, "no file provided"))?;

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::new(ErrorCode::UploadFailed, format!("failed to read file data: {e}")))?;

    Ok(data.to_vec())
}

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub key: String,
}

/// POST /images — append a gallery image.
///
/// The key is reserved from the profile's monotonic upload counter before
/// the object is stored; a failed store rolls the reservation back.
pub async fn upload_image(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<ImageUploadResponse>>)> {
    let data = read_image_bytes(&mut multipart).await?;
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let key = conn.transaction(|conn| {
        let profile = profiles::table
            .find(user.profile_id)
            .for_update()
            .first::<Profile>(conn)?;

        let key = media::gallery_key(profile.id, profile.uploaded);
        let mut images = profile.images.clone();
        images.push(key.clone());

        diesel::update(profiles::table.find(profile.id))
            .set((
                profiles::images.eq(images),
                profiles::uploaded.eq(profile.uploaded + 1),
            ))
            .execute(conn)?;

        Ok::<_, AppError>(key)
    })?;

    if let Err(e) = state.storage.upload(&state.storage.gallery_bucket, &key, data).await {
        remove_gallery_key(&mut conn, user.profile_id, &key)?;
        return Err(AppError::new(ErrorCode::UploadFailed, e));
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ImageUploadResponse { key })),
    ))
}

/// GET /images — gallery as time-limited URLs, in upload order.
pub async fn list_images(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let keys: Vec<String> = profiles::table
        .find(user.profile_id)
        .select(profiles::images)
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let mut urls = Vec::with_capacity(keys.len());
    for key in &keys {
        let url = state
            .storage
            .presigned_url(&state.storage.gallery_bucket, key, state.config.presign_ttl_secs)
            .await
            .map_err(AppError::internal)?;
        urls.push(url);
    }

    Ok(Json(ApiResponse::ok(urls)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageQuery {
    pub file: String,
}

/// DELETE /images?file= — remove one gallery image.
pub async fn delete_image(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    Query(query): Query<DeleteImageQuery>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let removed = remove_gallery_key(&mut conn, user.profile_id, &query.file)?;
    if !removed {
        return Err(AppError::new(ErrorCode::ImageNotFound, "image not in gallery"));
    }

    let storage = state.storage.clone();
    let key = query.file.clone();
    tokio::spawn(async move {
        if let Err(e) = storage.delete(&storage.gallery_bucket, &key).await {
            tracing::warn!(error = %e, key = %key, "gallery object delete failed");
        }
    });

    Ok(Json(ApiResponse::ok("image deleted")))
}

fn remove_gallery_key(conn: &mut PgConnection, profile_id: i32, key: &str) -> AppResult<bool> {
    conn.transaction(|conn| {
        let profile = profiles::table
            .find(profile_id)
            .for_update()
            .first::<Profile>(conn)?;

        if !profile.images.iter().any(|k| k == key) {
            return Ok(false);
        }

        let images: Vec<String> = profile.images.into_iter().filter(|k| k != key).collect();
        diesel::update(profiles::table.find(profile_id))
            .set(profiles::images.eq(images))
            .execute(conn)?;

        Ok::<_, AppError>(true)
    })
}

// --- Avatar ---

/// POST /avatar — store/replace the single avatar object for the caller.
pub async fn upload_avatar(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<&'static str>>)> {
    let data = read_image_bytes(&mut multipart).await?;

    let key = media::avatar_key(user.profile_id);
    state
        .storage
        .upload(&state.storage.avatars_bucket, &key, data)
        .await
        .map_err(|e| AppError::new(ErrorCode::UploadFailed, e))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    diesel::update(profiles::table.find(user.profile_id))
        .set(profiles::avatar.eq(true))
        .execute(&mut conn)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("avatar uploaded"))))
}

/// DELETE /avatar.
pub async fn delete_avatar(
    AccessUser(user): AccessUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    diesel::update(profiles::table.find(user.profile_id))
        .set(profiles::avatar.eq(false))
        .execute(&mut conn)?;

    let storage = state.storage.clone();
    let key = media::avatar_key(user.profile_id);
    tokio::spawn(async move {
        if let Err(e) = storage.delete(&storage.avatars_bucket, &key).await {
            tracing::warn!(error = %e, "avatar object delete failed");
        }
    });

    Ok(Json(ApiResponse::ok("avatar deleted")))
}
