use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::AuthRejection;

/// Gateway-level failures that terminate request handling.
#[derive(Debug)]
pub enum GatewayError {
    /// Missing or invalid credentials on a protected route.
    AuthRejected(AuthRejection),
    /// No upstream configured for the request path.
    RouteNotFound,
    /// The upstream did not answer within the proxy timeout.
    UpstreamTimeout,
    /// The upstream could not be reached or reset the connection.
    UpstreamUnreachable,
    /// Anything unexpected; details stay in the logs.
    Internal,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::AuthRejected(_) => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "Unauthorized Token" })),
            )
                .into_response(),
            GatewayError::RouteNotFound => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Proxy target not found").into_response()
            }
            GatewayError::UpstreamTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                Json(serde_json::json!({ "message": "Upstream request timed out" })),
            )
                .into_response(),
            GatewayError::UpstreamUnreachable => (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "message": "Upstream service unavailable" })),
            )
                .into_response(),
            GatewayError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "message": "Internal gateway error" })),
            )
                .into_response(),
        }
    }
}

impl From<AuthRejection> for GatewayError {
    fn from(rejection: AuthRejection) -> Self {
        GatewayError::AuthRejected(rejection)
    }
}
