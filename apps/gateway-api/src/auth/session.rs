//! Local verification of realtime session tokens.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{AuthRejection, Principal};

/// Claims carried by a session token.
#[derive(Debug, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Verify a session token against the shared signing secret.
///
/// The explicit `userId` claim (or the subject) becomes the principal's user
/// id; the `role` claim its role. Expired, unsigned, or identity-less tokens
/// are rejected.
pub fn verify_session_token(token: &str, secret: &str) -> Result<Principal, AuthRejection> {
    let validation = Validation::new(Algorithm::HS256);
    let data = jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(?e, "session token verification failed");
        AuthRejection::AuthFailed
    })?;

    let claims = data.claims;
    let user_id = claims
        .user_id
        .or(claims.sub)
        .filter(|s| !s.is_empty())
        .ok_or(AuthRejection::AuthFailed)?;
    let role = claims
        .role
        .filter(|s| !s.is_empty())
        .ok_or(AuthRejection::AuthFailed)?;

    Ok(Principal {
        user_id,
        role,
        claims: claims.extra,
    })
}
