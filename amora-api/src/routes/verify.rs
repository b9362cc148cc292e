use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::ApiResponse;

use crate::models::Auth;
use crate::schema::auth;
use crate::services::token_service;
use crate::AppState;

/// GET /verify/{id} — consume the opaque auth id from the mail link.
///
/// The id is rotated on success so the link is one-time.
pub async fn verify_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let account = auth::table
        .find(&id)
        .first::<Auth>(&mut conn)
        .optional()?
        .ok_or_else(|| {
            AppError::new(ErrorCode::VerificationTokenInvalid, "invalid verification token")
        })?;

    if account.verified {
        return Err(AppError::new(ErrorCode::AlreadyVerified, "email already verified"));
    }

    diesel::update(auth::table.find(&account.id))
        .set((
            auth::verified.eq(true),
            auth::id.eq(token_service::generate_auth_id()),
        ))
        .execute(&mut conn)?;

    tracing::info!(profile_id = account.profile_id, "email verified");

    Ok(Json(ApiResponse::ok("email verified")))
}

/// True while `now` still falls inside the cooldown window opened at `sent`.
/// A send at exactly the window edge is allowed.
fn throttled(sent: DateTime<Utc>, now: DateTime<Utc>, cooldown: Duration) -> bool {
    now - sent < cooldown
}

/// GET /resend/{email} — re-send the verification mail.
///
/// Throttled to one send per account per cooldown window. The
/// check-then-act on the stored timestamp runs under a row lock so two
/// concurrent resends cannot both pass the throttle.
pub async fn resend_verification(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    let email = email.to_lowercase();
    let cooldown = Duration::seconds(state.config.resend_cooldown_secs);
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let (to, auth_id) = conn.transaction(|conn| {
        let account = auth::table
            .filter(auth::email.eq(&email))
            .for_update()
            .first::<Auth>(conn)
            .optional()?
            .ok_or_else(|| AppError::not_found("unknown email"))?;

        if account.verified {
            return Err(AppError::new(ErrorCode::AlreadyVerified, "email already verified"));
        }

        let now = Utc::now();
        if throttled(account.sent, now, cooldown) {
            return Err(AppError::new(
                ErrorCode::ResendThrottled,
                "verification mail was sent recently, try again later",
            ));
        }

        let new_id = token_service::generate_auth_id();
        diesel::update(auth::table.find(&account.id))
            .set((auth::id.eq(&new_id), auth::sent.eq(now)))
            .execute(conn)?;

        Ok::<_, AppError>((account.email, new_id))
    })?;

    let mailer = state.email.clone();
    let link = format!("{}/verify/{}", state.config.public_base_url, auth_id);
    tokio::spawn(async move {
        if let Err(e) = mailer.send_verification_link(&to, &link).await {
            tracing::warn!(error = %e, "verification mail failed");
        }
    });

    Ok(Json(ApiResponse::ok("verification mail sent")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn resend_window_arithmetic() {
        let cooldown = Duration::seconds(45);
        let sent = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();

        // still inside the window
        assert!(throttled(sent, sent, cooldown));
        assert!(throttled(sent, sent + Duration::seconds(44), cooldown));

        // window edge and beyond
        assert!(!throttled(sent, sent + Duration::seconds(45), cooldown));
        assert!(!throttled(sent, sent + Duration::seconds(46), cooldown));
    }
}
