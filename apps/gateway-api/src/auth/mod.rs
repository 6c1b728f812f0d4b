//! Request and session authentication.

pub mod middleware;
pub mod session;
pub mod verify;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated identity attached to a request or session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: String,
    pub role: String,
    /// Raw claims from the verifier or token, for backends that need more
    /// than the identity pair.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub claims: Map<String, Value>,
}

impl Principal {
    /// Build a principal from a claims object. Requires a user id
    /// (`userId`, `id`, or `sub`) and a `role`.
    pub fn from_claims(claims: &Value) -> Option<Self> {
        let obj = claims.as_object()?;
        let user_id = ["userId", "id", "sub"]
            .iter()
            .find_map(|key| claim_string(obj.get(*key)?))?;
        let role = claim_string(obj.get("role")?)?;
        Some(Self {
            user_id,
            role,
            claims: obj.clone(),
        })
    }
}

/// User ids may arrive as JSON strings or numbers.
fn claim_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Why authentication was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No bearer token on a protected HTTP request.
    MissingToken,
    /// The identity verifier did not accept the token.
    InvalidToken,
    /// The session handshake credential failed local verification.
    AuthFailed,
}
