use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Credential & session errors
/// - E2xxx: Profile errors
/// - E3xxx: Affinity (like/dislike/match) errors
/// - E4xxx: Messaging errors
/// - E5xxx: Media errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,

    // Credential & session (E1xxx)
    InvalidCredentials,
    EmailAlreadyRegistered,
    EmailNotVerified,
    TokenExpired,
    TokenInvalid,
    WrongTokenScope,
    PasswordTooWeak,
    AdultsOnly,
    AlreadyVerified,
    ResendThrottled,
    VerificationTokenInvalid,

    // Profile (E2xxx)
    ProfileNotFound,
    IncompleteCoordinates,

    // Affinity (E3xxx)
    SelfReference,

    // Messaging (E4xxx)
    RecipientNotFound,

    // Media (E5xxx)
    UploadFailed,
    ImageNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0006",

            // Credential & session
            Self::InvalidCredentials => "E1001",
            Self::EmailAlreadyRegistered => "E1002",
            Self::EmailNotVerified => "E1003",
            Self::TokenExpired => "E1004",
            Self::TokenInvalid => "E1005",
            Self::WrongTokenScope => "E1006",
            Self::PasswordTooWeak => "E1007",
            Self::AdultsOnly => "E1008",
            Self::AlreadyVerified => "E1009",
            Self::ResendThrottled => "E1010",
            Self::VerificationTokenInvalid => "E1011",

            // Profile
            Self::ProfileNotFound => "E2001",
            Self::IncompleteCoordinates => "E2002",

            // Affinity
            Self::SelfReference => "E3001",

            // Messaging
            Self::RecipientNotFound => "E4001",

            // Media
            Self::UploadFailed => "E5001",
            Self::ImageNotFound => "E5002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::PasswordTooWeak
            | Self::AdultsOnly | Self::IncompleteCoordinates
            | Self::VerificationTokenInvalid => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials | Self::EmailNotVerified
            | Self::TokenExpired | Self::TokenInvalid | Self::WrongTokenScope
            | Self::EmailAlreadyRegistered => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::SelfReference => StatusCode::FORBIDDEN,
            Self::NotFound | Self::ProfileNotFound | Self::RecipientNotFound
            | Self::ImageNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyVerified => StatusCode::GONE,
            Self::ResendThrottled => StatusCode::TOO_EARLY,
            Self::UploadFailed => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// True when the error is a store uniqueness-constraint violation.
    ///
    /// The affinity engine uses this to turn a lost insert race into a
    /// toggle retry instead of a 5xx.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message } => {
                (code.status_code(), ApiErrorResponse::new(code.code(), message))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_contract() {
        assert_eq!(ErrorCode::AdultsOnly.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::EmailAlreadyRegistered.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::AlreadyVerified.status_code(), StatusCode::GONE);
        assert_eq!(ErrorCode::ResendThrottled.status_code(), StatusCode::TOO_EARLY);
        assert_eq!(ErrorCode::SelfReference.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::ProfileNotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unique_violation_detection() {
        let err = AppError::Database(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("duplicate key")),
        ));
        assert!(err.is_unique_violation());
        assert!(!AppError::bad_request("nope").is_unique_violation());
    }
}
