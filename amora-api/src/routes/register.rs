use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::ApiResponse;

use crate::models::{NewAuth, NewProfile, Profile};
use crate::schema::{auth, profiles};
use crate::services::{credential_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    pub name: String,
    pub birth: NaiveDate,
    pub sex: String,
    pub push_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub profile_id: i32,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;
    credential_service::validate_password(&req.password)?;
    credential_service::ensure_adult(req.birth)?;

    let password_hash = credential_service::hash_password(&req.password)?;
    let email = req.email.to_lowercase();

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let exists: i64 = auth::table
        .filter(auth::email.eq(&email))
        .count()
        .get_result(&mut conn)?;

    if exists > 0 {
        return Err(AppError::new(
            ErrorCode::EmailAlreadyRegistered,
            "email already registered",
        ));
    }

    let auth_id = token_service::generate_auth_id();

    let profile: Profile = conn.transaction(|conn| {
        let profile: Profile = diesel::insert_into(profiles::table)
            .values(&NewProfile {
                name: req.name.clone(),
                birth: req.birth,
                sex: req.sex.clone(),
                push_token: req.push_token.clone(),
            })
            .get_result(conn)?;

        diesel::insert_into(auth::table)
            .values(&NewAuth {
                id: auth_id.clone(),
                email: email.clone(),
                password_hash: password_hash.clone(),
                profile_id: profile.id,
                sent: Utc::now(),
            })
            .execute(conn)?;

        Ok::<_, AppError>(profile)
    })
    .map_err(registration_conflict)?;

    // Fire-and-forget verification mail; failure is logged, never surfaced.
    let mailer = state.email.clone();
    let link = format!("{}/verify/{}", state.config.public_base_url, auth_id);
    let to = email.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send_verification_link(&to, &link).await {
            tracing::warn!(error = %e, "verification mail failed");
        }
    });

    tracing::info!(profile_id = profile.id, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(RegisterResponse { profile_id: profile.id })),
    ))
}

/// A registration that loses a duplicate-email race hits the unique index
/// on `auth.email`; report it the same way as the pre-insert check.
fn registration_conflict(e: AppError) -> AppError {
    if e.is_unique_violation() {
        AppError::new(ErrorCode::EmailAlreadyRegistered, "email already registered")
    } else {
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insert_race_reports_registered_email() {
        let unique = AppError::Database(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("auth_email_key")),
        ));
        assert!(matches!(
            registration_conflict(unique),
            AppError::Known { code: ErrorCode::EmailAlreadyRegistered, .. }
        ));
    }

    #[test]
    fn other_errors_pass_through() {
        let err = registration_conflict(AppError::bad_request("nope"));
        assert!(matches!(
            err,
            AppError::Known { code: ErrorCode::BadRequest, .. }
        ));
    }
}
