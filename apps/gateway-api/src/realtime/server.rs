//! WebSocket endpoint: handshake authentication and the per-session loop.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use ordergate_common::id::{self, prefixed_ulid};

use crate::auth::session::verify_session_token;
use crate::auth::verify::bearer_token;
use crate::auth::AuthRejection;
use crate::AppState;

use super::events::{rooms, ClientMessage, EventName, ServerEvent};

/// Close code for failed handshake authentication.
const CLOSE_AUTH_FAILED: u16 = 4004;

#[derive(Debug, Deserialize)]
struct HandshakeQuery {
    #[serde(default)]
    token: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/realtime", get(ws_upgrade))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<HandshakeQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Credential from the query string or the upgrade request's bearer
    // header. Validated after the upgrade so a rejected client receives an
    // `error` event instead of a bare refused handshake.
    let token = query
        .token
        .or_else(|| bearer_token(&headers).map(str::to_string));
    ws.on_upgrade(move |socket| handle_connection(socket, state, token))
}

async fn handle_connection(socket: WebSocket, state: AppState, token: Option<String>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let verified = token
        .ok_or(AuthRejection::AuthFailed)
        .and_then(|t| verify_session_token(&t, &state.config.session_secret));
    let principal = match verified {
        Ok(principal) => principal,
        Err(_) => {
            let _ = send_event(&mut ws_tx, &ServerEvent::error("Authentication failed")).await;
            let _ = ws_tx
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_AUTH_FAILED,
                    reason: "Authentication failed".into(),
                })))
                .await;
            return;
        }
    };

    let session_id = prefixed_ulid(id::prefix::SESSION);
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    state
        .hub
        .registry()
        .register(session_id.clone(), principal.clone(), tx);

    tracing::info!(
        session_id = %session_id,
        user_id = %principal.user_id,
        role = %principal.role,
        "realtime session established"
    );

    let connected = ServerEvent::for_user(
        EventName::CONNECTED,
        serde_json::json!({
            "sessionId": session_id,
            "userId": principal.user_id,
            "role": principal.role,
        }),
        principal.user_id.clone(),
    );
    if send_event(&mut ws_tx, &connected).await.is_err() {
        state.hub.registry().deregister(&session_id);
        return;
    }

    loop {
        tokio::select! {
            // Client sends us a message.
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => handle_client_message(&state, &session_id, msg),
                            Err(_) => ServerEvent::error("Unsupported message"),
                        };
                        if send_event(&mut ws_tx, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, session_id = %session_id, "ws read error");
                        break;
                    }
                    _ => continue,
                }
            }

            // Event from the broadcast hub.
            outgoing = rx.recv() => {
                match outgoing {
                    Some(event) => {
                        if send_event(&mut ws_tx, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    state.hub.registry().deregister(&session_id);

    tracing::info!(
        session_id = %session_id,
        user_id = %principal.user_id,
        "realtime session ended"
    );
}

/// Apply one client message to the session and build the acknowledgement.
fn handle_client_message(state: &AppState, session_id: &str, msg: ClientMessage) -> ServerEvent {
    let registry = state.hub.registry();
    match msg {
        ClientMessage::Ping => ServerEvent::new(EventName::PONG, serde_json::json!({})),
        ClientMessage::SubscribeToOrders => {
            registry.join_room(session_id, rooms::ORDER_UPDATES);
            subscription_ack(EventName::SUBSCRIPTION_CONFIRMED, rooms::ORDER_UPDATES)
        }
        ClientMessage::SubscribeToInventory => {
            registry.join_room(session_id, rooms::INVENTORY_UPDATES);
            subscription_ack(EventName::SUBSCRIPTION_CONFIRMED, rooms::INVENTORY_UPDATES)
        }
        ClientMessage::Subscribe { topic } => {
            let room = rooms::topic(&topic);
            registry.join_room(session_id, &room);
            subscription_ack(EventName::SUBSCRIPTION_CONFIRMED, &room)
        }
        ClientMessage::Unsubscribe { topic } => {
            let room = rooms::topic(&topic);
            registry.leave_room(session_id, &room);
            subscription_ack(EventName::SUBSCRIPTION_CANCELLED, &room)
        }
    }
}

fn subscription_ack(event: &'static str, room: &str) -> ServerEvent {
    ServerEvent::new(event, serde_json::json!({ "channel": room }))
}

/// Serialize and send one event over the socket.
async fn send_event(
    ws_tx: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    ws_tx.send(Message::Text(json.into())).await
}
