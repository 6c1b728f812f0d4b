//! Translation from domain events to realtime broadcasts.

pub mod dispatch;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An order status change as reported by the order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub alias_id: String,
    pub user_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<String>,
}

/// Stock level states reported by the inventory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    LowStock,
    OutOfStock,
    Restocked,
}

/// An inventory level change as reported by the inventory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUpdate {
    pub product_id: String,
    pub name: String,
    pub status: StockStatus,
    pub quantity: i64,
}

/// Domain events the platform pushes through the gateway. Timestamps are
/// stamped on the wire envelope at delivery time.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderStatus(OrderStatusUpdate),
    InventoryChange(InventoryUpdate),
    System { payload: Value },
    UserSpecific { user_id: String, payload: Value },
}
