//! Correlation-id stamping for every inbound request.
//!
//! Runs outermost so that error responses produced anywhere in the pipeline
//! still carry the id.

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use ordergate_common::id::{self, prefixed_ulid};

use crate::AppState;

/// Correlation id attached to request extensions for downstream handlers.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

/// Fallback if the configured header name is unusable.
const DEFAULT_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Read or generate the correlation id, expose it to handlers, and reflect
/// it onto both the forwarded request and the outbound response.
pub async fn correlate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let header = HeaderName::from_bytes(state.config.correlation_header.as_bytes())
        .unwrap_or(DEFAULT_HEADER);

    let id = req
        .headers()
        .get(&header)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| prefixed_ulid(id::prefix::REQUEST));

    req.extensions_mut().insert(CorrelationId(id.clone()));
    if let Ok(value) = HeaderValue::from_str(&id) {
        req.headers_mut().insert(header.clone(), value);
    }

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(header, value);
    }
    response
}
