//! Bearer-token extraction for the internal management surface.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::AppState;

use super::verify::bearer_token;
use super::Principal;

/// Principal extracted from the `Authorization: Bearer <token>` header via
/// the remote verifier.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

/// Rejection returned when the bearer token is missing or invalid.
pub struct AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Unauthorized Token" })),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError)?;
        let principal = state
            .verifier
            .verify_bearer(token)
            .await
            .map_err(|_| AuthError)?;
        Ok(AuthPrincipal(principal))
    }
}
