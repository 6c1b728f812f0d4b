//! Fallback handler that forwards unmatched requests to backend services.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;

use crate::correlation::CorrelationId;
use crate::error::GatewayError;
use crate::AppState;

/// Header carrying the serialized principal to backends, so they can
/// trust-but-verify identity without re-validating the token.
pub const PRINCIPAL_HEADER: &str = "x-gateway-principal";

/// Hop-by-hop headers that must not be forwarded in either direction.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Authenticate (for protected prefixes), resolve the upstream, forward the
/// request, and stream the upstream response back.
pub async fn proxy_request(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, GatewayError> {
    let correlation_id = req
        .extensions()
        .get::<CorrelationId>()
        .map(|c| c.0.clone())
        .unwrap_or_default();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Authentication gates protected prefixes before any routing happens.
    let mut principal = None;
    if state
        .config
        .protected_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
    {
        principal = state
            .verifier
            .authenticate_http(&method, &path, req.headers())
            .await
            .map_err(|rejection| {
                tracing::warn!(%correlation_id, %method, %path, ?rejection, "request rejected");
                GatewayError::AuthRejected(rejection)
            })?;
    }

    let Some(route) = state.routes.resolve(&path) else {
        tracing::warn!(%correlation_id, %path, "no upstream for path");
        return Err(GatewayError::RouteNotFound);
    };

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let target = format!("{}{}", route.upstream, path_and_query);

    let mut headers = req.headers().clone();
    strip_hop_headers(&mut headers);
    headers.remove(HOST);
    if let Some(principal) = &principal {
        match serde_json::to_string(principal)
            .ok()
            .and_then(|json| HeaderValue::from_str(&json).ok())
        {
            Some(value) => {
                headers.insert(HeaderName::from_static(PRINCIPAL_HEADER), value);
            }
            None => {
                tracing::warn!(%correlation_id, "principal not header-safe; forwarding without it")
            }
        }
    }

    tracing::debug!(%correlation_id, %method, %path, upstream = %route.upstream, "proxying request");

    let body = reqwest::Body::wrap_stream(req.into_body().into_data_stream());
    let upstream = state
        .http
        .request(method, &target)
        .headers(headers)
        .body(body)
        .timeout(state.config.proxy_timeout)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(%correlation_id, %target, ?e, "upstream request failed");
            if e.is_timeout() {
                GatewayError::UpstreamTimeout
            } else if e.is_builder() {
                // A malformed target URL is our fault, not the upstream's.
                GatewayError::Internal
            } else {
                GatewayError::UpstreamUnreachable
            }
        })?;

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    strip_hop_headers(&mut response_headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

fn strip_hop_headers(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
