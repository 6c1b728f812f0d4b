//! Remote identity verification for proxied HTTP requests.

use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method};

use crate::config::PublicRoute;

use super::{AuthRejection, Principal};

/// Client for the platform's identity-verification endpoint.
///
/// Owns its own `reqwest::Client` so verification calls carry a bounded
/// timeout distinct from the proxy timeout.
#[derive(Clone)]
pub struct IdentityVerifier {
    http: reqwest::Client,
    verify_url: String,
    timeout: Duration,
    public_routes: Vec<PublicRoute>,
}

impl IdentityVerifier {
    pub fn new(verify_url: &str, timeout: Duration, public_routes: Vec<PublicRoute>) -> Self {
        Self {
            http: reqwest::Client::new(),
            verify_url: verify_url.to_string(),
            timeout,
            public_routes,
        }
    }

    /// Whether a route is exempt from bearer authentication (exact method
    /// and path-suffix match).
    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        self.public_routes
            .iter()
            .any(|route| route.method == *method && path.ends_with(&route.suffix))
    }

    /// Authenticate a proxied HTTP request.
    ///
    /// Public routes pass with no principal and no verifier call. Everything
    /// else must carry `Authorization: Bearer <token>`, which is verified
    /// remotely.
    pub async fn authenticate_http(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Option<Principal>, AuthRejection> {
        if self.is_public(method, path) {
            return Ok(None);
        }
        let token = bearer_token(headers).ok_or(AuthRejection::MissingToken)?;
        self.verify_bearer(token).await.map(Some)
    }

    /// Delegate bearer-token verification to the remote endpoint.
    pub async fn verify_bearer(&self, token: &str) -> Result<Principal, AuthRejection> {
        let response = self
            .http
            .get(&self.verify_url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(?e, "identity verification call failed");
                AuthRejection::InvalidToken
            })?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "identity verification refused token");
            return Err(AuthRejection::InvalidToken);
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            tracing::warn!(?e, "identity verification returned an unreadable body");
            AuthRejection::InvalidToken
        })?;

        // The verifier may wrap the identity in a `user` object.
        Principal::from_claims(&body)
            .or_else(|| body.get("user").and_then(Principal::from_claims))
            .ok_or(AuthRejection::InvalidToken)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")
}
