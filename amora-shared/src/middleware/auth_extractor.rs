use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{AuthKeys, AuthUser, Claims, TokenScope};

/// Caller authenticated with an access-scoped bearer token.
///
/// Used by every protected route except `GET /refresh`.
pub struct AccessUser(pub AuthUser);

/// Caller authenticated with a refresh-scoped bearer token.
///
/// Only the token-renewal route accepts this.
pub struct RefreshUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AccessUser
where
    AuthKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = AuthKeys::from_ref(state);
        let token = extract_bearer_token(&parts.headers)?;
        let claims = decode_scoped(&token, &keys, TokenScope::Access)?;
        Ok(Self(AuthUser::from(claims)))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RefreshUser
where
    AuthKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = AuthKeys::from_ref(state);
        let token = extract_bearer_token(&parts.headers)?;
        let claims = decode_scoped(&token, &keys, TokenScope::Refresh)?;
        Ok(Self(AuthUser::from(claims)))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::Unauthorized, "invalid authorization header"))?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::new(
            ErrorCode::Unauthorized,
            "authorization header must use Bearer scheme",
        ));
    }

    Ok(auth_header[7..].to_string())
}

/// Decode a bearer token against the secret for `scope`.
///
/// Rejects on bad signature, malformed payload, past expiry, or a scope
/// claim that does not match the gate being passed.
pub fn decode_scoped(token: &str, keys: &AuthKeys, scope: TokenScope) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(keys.secret_for(scope).as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::new(ErrorCode::TokenExpired, "token has expired")
        }
        _ => AppError::new(ErrorCode::TokenInvalid, format!("invalid token: {e}")),
    })?;

    let claims = token_data.claims;

    if claims.scope != scope {
        return Err(AppError::new(
            ErrorCode::WrongTokenScope,
            format!("expected {scope} token"),
        ));
    }
    if claims.is_expired() {
        return Err(AppError::new(ErrorCode::TokenExpired, "token has expired"));
    }

    Ok(claims)
}
