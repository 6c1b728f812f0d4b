//! Internal management surface for backend services.
//!
//! Every endpoint requires a valid principal and answers with the uniform
//! `{success, message, …}` shape.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::middleware::AuthPrincipal;
use crate::notify::dispatch::{BroadcastRequest, DispatchResult};
use crate::notify::{InventoryUpdate, OrderStatusUpdate};
use crate::realtime::hub::ConnectionStats;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/internal/connections/stats", get(connection_stats))
        .route("/internal/connections/users", get(online_users))
        .route("/internal/connections/{user_id}/online", get(user_online))
        .route("/internal/broadcast", post(broadcast))
        .route("/internal/notifications/order-created", post(order_created))
        .route("/internal/notifications/order-status", post(order_status))
        .route("/internal/notifications/inventory", post(inventory))
}

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct StatsResponse {
    success: bool,
    message: String,
    data: ConnectionStats,
}

async fn connection_stats(
    _auth: AuthPrincipal,
    State(state): State<AppState>,
) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        message: "connection stats".to_string(),
        data: state.hub.connection_stats(),
    })
}

#[derive(Debug, Serialize)]
struct OnlineUsersResponse {
    success: bool,
    message: String,
    #[serde(rename = "onlineUserIds")]
    online_user_ids: Vec<String>,
}

async fn online_users(
    _auth: AuthPrincipal,
    State(state): State<AppState>,
) -> Json<OnlineUsersResponse> {
    let online_user_ids = state.hub.connection_stats().online_user_ids;
    Json(OnlineUsersResponse {
        success: true,
        message: format!("{} users online", online_user_ids.len()),
        online_user_ids,
    })
}

#[derive(Debug, Serialize)]
struct UserOnlineResponse {
    success: bool,
    message: String,
    online: bool,
}

async fn user_online(
    _auth: AuthPrincipal,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<UserOnlineResponse> {
    let online = state.hub.is_user_online(&user_id);
    Json(UserOnlineResponse {
        success: true,
        message: format!(
            "user {user_id} is {}",
            if online { "online" } else { "offline" }
        ),
        online,
    })
}

// ---------------------------------------------------------------------------
// Broadcast triggers
// ---------------------------------------------------------------------------

async fn broadcast(
    _auth: AuthPrincipal,
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> Json<DispatchResult> {
    Json(state.dispatcher.broadcast(request))
}

async fn order_created(
    _auth: AuthPrincipal,
    State(state): State<AppState>,
    Json(update): Json<OrderStatusUpdate>,
) -> Json<DispatchResult> {
    Json(state.dispatcher.order_created(update))
}

async fn order_status(
    _auth: AuthPrincipal,
    State(state): State<AppState>,
    Json(update): Json<OrderStatusUpdate>,
) -> Json<DispatchResult> {
    Json(state.dispatcher.order_status_changed(update))
}

async fn inventory(
    _auth: AuthPrincipal,
    State(state): State<AppState>,
    Json(update): Json<InventoryUpdate>,
) -> Json<DispatchResult> {
    Json(state.dispatcher.inventory_changed(update))
}
