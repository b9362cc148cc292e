use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;

use amora_shared::errors::AppError;
use amora_shared::types::auth::{AuthKeys, Claims, TokenPair, TokenScope};

pub fn create_token(
    profile_id: i32,
    scope: TokenScope,
    keys: &AuthKeys,
    ttl_secs: i64,
) -> Result<String, AppError> {
    let claims = Claims::new(profile_id, scope, ttl_secs);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(keys.secret_for(scope).as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

/// Issue an access/refresh pair for a profile.
///
/// The two tokens are signed with distinct secrets and carry a scope
/// claim, so possession of one can never be used at the other gate.
pub fn issue_token_pair(
    profile_id: i32,
    keys: &AuthKeys,
    access_ttl: i64,
    refresh_ttl: i64,
) -> Result<TokenPair, AppError> {
    let access_token = create_token(profile_id, TokenScope::Access, keys, access_ttl)?;
    let refresh_token = create_token(profile_id, TokenScope::Refresh, keys, refresh_ttl)?;
    Ok(TokenPair::new(access_token, refresh_token, access_ttl))
}

/// Opaque high-entropy identifier for the auth row, doubling as the
/// one-time email-verification link token. 32 random bytes, hex-encoded.
pub fn generate_auth_id() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amora_shared::middleware::decode_scoped;
    use amora_shared::ErrorCode;

    fn keys() -> AuthKeys {
        AuthKeys {
            access_secret: "access-test-secret".into(),
            refresh_secret: "refresh-test-secret".into(),
        }
    }

    #[test]
    fn roundtrip_access_token() {
        let keys = keys();
        let pair = issue_token_pair(42, &keys, 1800, 604800).unwrap();
        let claims = decode_scoped(&pair.access_token, &keys, TokenScope::Access).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.scope, TokenScope::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_rejected_at_access_gate() {
        let keys = keys();
        let pair = issue_token_pair(7, &keys, 1800, 604800).unwrap();
        let err = decode_scoped(&pair.refresh_token, &keys, TokenScope::Access).unwrap_err();
        assert!(matches!(
            err,
            AppError::Known { code: ErrorCode::TokenInvalid, .. }
        ));
    }

    #[test]
    fn access_token_rejected_at_refresh_gate() {
        let keys = keys();
        let pair = issue_token_pair(7, &keys, 1800, 604800).unwrap();
        assert!(decode_scoped(&pair.access_token, &keys, TokenScope::Refresh).is_err());
    }

    #[test]
    fn scope_claim_checked_even_with_shared_secret() {
        // Misconfigured deployment where both secrets are equal: the scope
        // claim must still keep the gates apart.
        let keys = AuthKeys {
            access_secret: "same".into(),
            refresh_secret: "same".into(),
        };
        let token = create_token(1, TokenScope::Refresh, &keys, 60).unwrap();
        let err = decode_scoped(&token, &keys, TokenScope::Access).unwrap_err();
        assert!(matches!(
            err,
            AppError::Known { code: ErrorCode::WrongTokenScope, .. }
        ));
    }

    #[test]
    fn expired_token_rejected() {
        let keys = keys();
        let token = create_token(1, TokenScope::Access, &keys, -120).unwrap();
        let err = decode_scoped(&token, &keys, TokenScope::Access).unwrap_err();
        assert!(matches!(
            err,
            AppError::Known { code: ErrorCode::TokenExpired, .. }
        ));
    }

    #[test]
    fn auth_id_format() {
        let id = generate_auth_id();
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_auth_id());
    }
}
