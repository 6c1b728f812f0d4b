//! Broadcast hub: room-targeted fan-out over live sessions.
//!
//! Every delivery is best-effort and at-most-once per session. Deliveries
//! iterate a snapshot of the matching sessions, so a concurrent disconnect
//! surfaces as a closed channel for that one session and never affects the
//! rest of the room.

use serde::Serialize;
use serde_json::Value;

use crate::notify::{InventoryUpdate, OrderStatusUpdate, StockStatus};

use super::events::{rooms, EventName, ServerEvent};
use super::registry::{SessionHandle, SessionRegistry};

/// Connection statistics computed from live registry state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub authenticated_users: usize,
    pub online_user_ids: Vec<String>,
}

/// The broadcast hub. Owns the session registry; shared via `AppState`.
pub struct RealtimeHub {
    registry: SessionRegistry,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Deliver an order status change to the interested rooms: the order's
    /// owner, back-office roles, and topic subscribers. A session in
    /// several of those rooms receives a single copy.
    pub fn broadcast_order_update(&self, update: &OrderStatusUpdate) -> usize {
        let targets = self.registry.members_of_any(&[
            rooms::user(&update.user_id),
            rooms::role("admin"),
            rooms::role("staff"),
            rooms::ORDER_UPDATES.to_string(),
        ]);
        let event = ServerEvent::for_user(
            EventName::ORDER_UPDATE,
            json_value(update),
            update.user_id.clone(),
        );
        self.deliver(targets, event)
    }

    /// Deliver an inventory change to topic subscribers; low- and
    /// out-of-stock states additionally alert admins.
    pub fn broadcast_inventory_update(&self, update: &InventoryUpdate) -> usize {
        let mut delivered = self.deliver(
            self.registry
                .members_of_any(&[rooms::INVENTORY_UPDATES.to_string()]),
            ServerEvent::new(EventName::INVENTORY_UPDATE, json_value(update)),
        );
        if matches!(
            update.status,
            StockStatus::LowStock | StockStatus::OutOfStock
        ) {
            delivered += self.deliver(
                self.registry.members_of_any(&[rooms::role("admin")]),
                ServerEvent::new(EventName::INVENTORY_ALERT, json_value(update)),
            );
        }
        delivered
    }

    pub fn send_user_notification(&self, user_id: &str, payload: Value) -> usize {
        let targets = self.registry.members_of_any(&[rooms::user(user_id)]);
        self.deliver(
            targets,
            ServerEvent::for_user(EventName::USER_NOTIFICATION, payload, user_id),
        )
    }

    pub fn broadcast_system_notification(&self, payload: Value) -> usize {
        self.deliver(
            self.registry.all_sessions(),
            ServerEvent::new(EventName::SYSTEM_NOTIFICATION, payload),
        )
    }

    pub fn send_role_notification(&self, role: &str, payload: Value) -> usize {
        let targets = self.registry.members_of_any(&[rooms::role(role)]);
        self.deliver(
            targets,
            ServerEvent::new(EventName::ROLE_NOTIFICATION, payload),
        )
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        ConnectionStats {
            total_connections: self.registry.connection_count(),
            authenticated_users: self.registry.user_count(),
            online_user_ids: self.registry.online_user_ids(),
        }
    }

    pub fn is_user_online(&self, user_id: &str) -> bool {
        self.registry.is_user_online(user_id)
    }

    /// Fire-and-forget delivery to a snapshot of sessions. A session that
    /// disconnected since the snapshot has a closed channel; that failure
    /// is logged and never aborts the remaining deliveries.
    fn deliver(&self, targets: Vec<SessionHandle>, event: ServerEvent) -> usize {
        let mut delivered = 0;
        for target in targets {
            match target.sender.send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::debug!(
                        session_id = %target.session_id,
                        event = event.event,
                        "session gone; dropping event"
                    );
                }
            }
        }
        delivered
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

fn json_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}
