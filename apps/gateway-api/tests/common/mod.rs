//! Shared helpers for gateway integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use tokio_tungstenite::tungstenite;

use gateway_api::config::{Config, PublicRoute};
use gateway_api::proxy::table::RouteTable;
use gateway_api::{routes, AppState};

/// Shared secret used to mint and verify session tokens in tests.
pub const TEST_SECRET: &str = "gateway-test-secret";

/// The one bearer token the mock verifier accepts.
pub const TEST_TOKEN: &str = "valid-service-token";

/// Build a test config pointing at the given verifier endpoint.
pub fn test_config(auth_verify_url: &str) -> Config {
    Config {
        port: 0,
        auth_verify_url: auth_verify_url.to_string(),
        session_secret: TEST_SECRET.to_string(),
        allowed_origins: vec!["*".to_string()],
        route_table_path: String::new(),
        correlation_header: "x-correlation-id".to_string(),
        protected_prefixes: vec!["/api".to_string()],
        public_routes: vec![
            PublicRoute {
                method: Method::POST,
                suffix: "/login".to_string(),
            },
            PublicRoute {
                method: Method::POST,
                suffix: "/register".to_string(),
            },
        ],
        proxy_timeout: Duration::from_secs(5),
        auth_timeout: Duration::from_secs(2),
    }
}

/// Bind a router on an ephemeral port and serve it in the background.
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a gateway wired to `table`, returning its address and state.
pub async fn start_gateway(config: Config, table: RouteTable) -> (SocketAddr, AppState) {
    let state = AppState::new(config, table);
    let addr = spawn(routes::app(state.clone())).await;
    (addr, state)
}

// ---------------------------------------------------------------------------
// Mock collaborators
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct VerifierState {
    hits: Arc<AtomicUsize>,
}

async fn verify_handler(State(state): State<VerifierState>, headers: HeaderMap) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let expected = format!("Bearer {TEST_TOKEN}");
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);
    if authorized {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "userId": "svc_1", "role": "staff" })),
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "invalid token" })),
        )
            .into_response()
    }
}

/// A mock identity verifier accepting exactly `TEST_TOKEN`, counting calls.
pub fn mock_verifier() -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/verify", get(verify_handler))
        .with_state(VerifierState { hits: hits.clone() });
    (app, hits)
}

async fn echo_handler(State(name): State<&'static str>, req: Request) -> Json<serde_json::Value> {
    let header = |key: &str| {
        req.headers()
            .get(key)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(serde_json::json!({
        "upstream": name,
        "path": req.uri().path(),
        "principal": header("x-gateway-principal"),
        "correlationId": header("x-correlation-id"),
    }))
}

/// A mock upstream that echoes the request path and gateway headers.
pub fn echo_upstream(name: &'static str) -> Router {
    Router::new().fallback(echo_handler).with_state(name)
}

async fn slow_handler() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}

/// A mock upstream that answers far past any sane proxy timeout.
pub fn slow_upstream() -> Router {
    Router::new().fallback(slow_handler)
}

// ---------------------------------------------------------------------------
// Session tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct TestClaims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Mint a session token signed with the shared test secret.
pub fn mint_session_token(user_id: &str, role: &str, ttl_secs: i64) -> String {
    let now = chrono::Utc::now();
    let claims = TestClaims {
        sub: user_id.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::seconds(ttl_secs)).timestamp(),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("mint session token")
}

// ---------------------------------------------------------------------------
// WebSocket clients
// ---------------------------------------------------------------------------

pub type WsClient =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Connect to the realtime endpoint with a handshake token.
pub async fn connect_realtime(addr: SocketAddr, token: &str) -> WsClient {
    let url = format!("ws://{addr}/realtime?token={token}");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

/// Read the next text frame as JSON, skipping transport frames.
pub async fn next_event(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for event")
            .expect("stream ended")
            .expect("ws read error");
        if let tungstenite::Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("parse event");
        }
    }
}

/// Read the next text frame if one arrives within `wait`.
pub async fn try_next_event(ws: &mut WsClient, wait: Duration) -> Option<serde_json::Value> {
    match tokio::time::timeout(wait, ws.next()).await {
        Ok(Some(Ok(tungstenite::Message::Text(text)))) => {
            Some(serde_json::from_str(&text).expect("parse event"))
        }
        _ => None,
    }
}

/// Send a JSON message to the gateway.
pub async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    ws.send(tungstenite::Message::Text(value.to_string().into()))
        .await
        .expect("ws send");
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
