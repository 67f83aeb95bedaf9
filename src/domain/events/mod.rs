//! Domain events, published to NATS when a client is configured.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::status::OrderItemStatus;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderPlaced {
        order_id: Uuid,
        order_number: String,
        total: Decimal,
    },
    ItemStatusChanged {
        order_id: Uuid,
        item_id: Uuid,
        from: OrderItemStatus,
        to: OrderItemStatus,
        reason: Option<String>,
    },
    RefundOpened {
        order_id: Uuid,
        item_id: Uuid,
        amount: Decimal,
    },
    RefundCompleted {
        order_id: Uuid,
        item_id: Uuid,
    },
}

impl DomainEvent {
    /// NATS subject this event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "orders.placed",
            Self::ItemStatusChanged { .. } => "orders.item_status_changed",
            Self::RefundOpened { .. } => "orders.refund_opened",
            Self::RefundCompleted { .. } => "orders.refund_completed",
        }
    }
}
