use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Which gate a bearer token is allowed to pass.
///
/// Access and refresh tokens are signed with distinct secrets; the scope
/// claim is checked on top of the signature so a refresh token never
/// validates at the access gate even if the two secrets were configured
/// to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenScope::Access => write!(f, "access"),
            TokenScope::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric profile id of the caller.
    pub sub: i32,
    pub scope: TokenScope,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(profile_id: i32, scope: TokenScope, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: profile_id,
            scope,
            iat: now,
            exp: now + duration_secs,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Signing secrets for the two token scopes, injected from configuration.
#[derive(Debug, Clone)]
pub struct AuthKeys {
    pub access_secret: String,
    pub refresh_secret: String,
}

impl AuthKeys {
    pub fn secret_for(&self, scope: TokenScope) -> &str {
        match scope {
            TokenScope::Access => &self.access_secret,
            TokenScope::Refresh => &self.refresh_secret,
        }
    }
}

/// Authenticated caller resolved from a bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub profile_id: i32,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            profile_id: claims.sub,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
