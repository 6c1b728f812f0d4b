//! Notification dispatcher: maps domain requests onto hub broadcasts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::realtime::hub::RealtimeHub;

use super::{DomainEvent, InventoryUpdate, OrderStatusUpdate, StockStatus};

/// Uniform result reported back to dispatch callers.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,
}

impl DispatchResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Target scope for a generic broadcast request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastTarget {
    System,
    Role,
    User,
}

/// A generic broadcast request from a backend service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub target: BroadcastTarget,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

/// Thin translation layer over the realtime hub.
pub struct NotificationDispatcher {
    hub: Arc<RealtimeHub>,
}

impl NotificationDispatcher {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self { hub }
    }

    /// Fan a domain event out to its rooms, returning the delivered-session
    /// count.
    pub fn publish(&self, event: DomainEvent) -> usize {
        match event {
            DomainEvent::OrderStatus(update) => self.hub.broadcast_order_update(&update),
            DomainEvent::InventoryChange(update) => self.hub.broadcast_inventory_update(&update),
            DomainEvent::System { payload } => self.hub.broadcast_system_notification(payload),
            DomainEvent::UserSpecific { user_id, payload } => {
                self.hub.send_user_notification(&user_id, payload)
            }
        }
    }

    /// A newly placed order: broadcast plus a personal confirmation.
    pub fn order_created(&self, update: OrderStatusUpdate) -> DispatchResult {
        let message = format!("Your order {} has been placed.", update.alias_id);
        let user_id = update.user_id.clone();
        let delivered = self.publish(DomainEvent::OrderStatus(update));
        self.hub
            .send_user_notification(&user_id, serde_json::json!({ "message": message }));
        DispatchResult::ok(format!(
            "order notification delivered to {delivered} sessions"
        ))
    }

    /// An order changing status: broadcast plus a personal update.
    pub fn order_status_changed(&self, update: OrderStatusUpdate) -> DispatchResult {
        let message = format!("Your order {} is now {}.", update.alias_id, update.status);
        let user_id = update.user_id.clone();
        let delivered = self.publish(DomainEvent::OrderStatus(update));
        self.hub
            .send_user_notification(&user_id, serde_json::json!({ "message": message }));
        DispatchResult::ok(format!(
            "order notification delivered to {delivered} sessions"
        ))
    }

    /// An inventory level change: broadcast plus an admin-facing summary.
    pub fn inventory_changed(&self, update: InventoryUpdate) -> DispatchResult {
        let message = match update.status {
            StockStatus::LowStock => format!(
                "{} is low on stock ({} remaining).",
                update.name, update.quantity
            ),
            StockStatus::OutOfStock => format!("{} is out of stock.", update.name),
            StockStatus::Restocked => format!(
                "{} has been restocked ({} available).",
                update.name, update.quantity
            ),
        };
        let delivered = self.publish(DomainEvent::InventoryChange(update));
        self.hub
            .send_role_notification("admin", serde_json::json!({ "message": message }));
        DispatchResult::ok(format!(
            "inventory notification delivered to {delivered} sessions"
        ))
    }

    /// Generic system/role/user broadcast with target validation.
    pub fn broadcast(&self, request: BroadcastRequest) -> DispatchResult {
        match request.target {
            BroadcastTarget::System => {
                let delivered = self.publish(DomainEvent::System {
                    payload: request.payload,
                });
                DispatchResult::ok(format!(
                    "system notification delivered to {delivered} sessions"
                ))
            }
            BroadcastTarget::Role => match request.role {
                Some(role) if !role.is_empty() => {
                    let delivered = self.hub.send_role_notification(&role, request.payload);
                    DispatchResult::ok(format!(
                        "role notification delivered to {delivered} sessions"
                    ))
                }
                _ => DispatchResult::failure("role is required for role-targeted broadcasts"),
            },
            BroadcastTarget::User => match request.user_id {
                Some(user_id) if !user_id.is_empty() => {
                    let delivered = self.publish(DomainEvent::UserSpecific {
                        user_id,
                        payload: request.payload,
                    });
                    DispatchResult::ok(format!(
                        "user notification delivered to {delivered} sessions"
                    ))
                }
                _ => DispatchResult::failure("userId is required for user-targeted broadcasts"),
            },
        }
    }
}
