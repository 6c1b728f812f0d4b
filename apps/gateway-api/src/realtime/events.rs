//! Realtime wire-format messages and room naming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Server → Client events
// ---------------------------------------------------------------------------

/// Event names delivered to clients.
pub struct EventName;

impl EventName {
    pub const CONNECTED: &'static str = "connected";
    pub const ERROR: &'static str = "error";
    pub const PONG: &'static str = "pong";
    pub const SUBSCRIPTION_CONFIRMED: &'static str = "subscription_confirmed";
    pub const SUBSCRIPTION_CANCELLED: &'static str = "subscription_cancelled";
    pub const ORDER_UPDATE: &'static str = "order_update";
    pub const INVENTORY_UPDATE: &'static str = "inventory_update";
    pub const INVENTORY_ALERT: &'static str = "inventory_alert";
    pub const USER_NOTIFICATION: &'static str = "user_notification";
    pub const SYSTEM_NOTIFICATION: &'static str = "system_notification";
    pub const ROLE_NOTIFICATION: &'static str = "role_notification";
}

/// An event sent from the gateway to a client.
#[derive(Debug, Clone, Serialize)]
pub struct ServerEvent {
    #[serde(rename = "type")]
    pub event: &'static str,
    pub data: Value,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ServerEvent {
    pub fn new(event: &'static str, data: Value) -> Self {
        Self {
            event,
            data,
            user_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn for_user(event: &'static str, data: Value, user_id: impl Into<String>) -> Self {
        Self {
            event,
            data,
            user_id: Some(user_id.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self::new(EventName::ERROR, serde_json::json!({ "message": message }))
    }
}

// ---------------------------------------------------------------------------
// Client → Server messages
// ---------------------------------------------------------------------------

/// A message received from a client, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    SubscribeToOrders,
    SubscribeToInventory,
    Subscribe { topic: String },
    Unsubscribe { topic: String },
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// Room labels used for multicast targeting.
pub mod rooms {
    pub const ORDER_UPDATES: &str = "order_updates";
    pub const INVENTORY_UPDATES: &str = "inventory_updates";

    pub fn user(user_id: &str) -> String {
        format!("user:{user_id}")
    }

    pub fn role(role: &str) -> String {
        format!("role:{role}")
    }

    pub fn topic(topic: &str) -> String {
        format!("{topic}_updates")
    }
}
