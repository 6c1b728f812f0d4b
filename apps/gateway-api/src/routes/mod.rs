pub mod health;
pub mod management;

use axum::http::HeaderValue;
use axum::middleware;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{correlation, proxy, realtime, AppState};

/// Gateway-owned routes; everything else falls through to the proxy.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(realtime::server::router())
        .merge(management::router())
        .fallback(proxy::forward::proxy_request)
}

/// The full application: routes plus panic containment, correlation, CORS,
/// and trace layers. Panic containment sits inside the correlation layer so
/// even a 500 from a panicked handler carries the correlation id.
pub fn app(state: AppState) -> Router {
    router()
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            correlation::correlate,
        ))
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
