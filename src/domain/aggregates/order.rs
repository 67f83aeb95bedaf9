//! Order aggregate.
//!
//! Owns its items and every status transition they make. All edges are
//! validated against the status registry before anything mutates; a request
//! with one illegal edge changes nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::events::DomainEvent;
use crate::domain::pricing::PriceBreakdown;
use crate::domain::status::OrderItemStatus;
use crate::domain::value_objects::{Money, Reason};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Completed,
}

impl RefundStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub street1: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zip: String,
    pub country: String,
    pub phone: Option<String>,
}

#[derive(Clone, Debug)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub status: OrderItemStatus,
    pub reason: Option<String>,
    pub refund_amount: Option<Money>,
    pub refund_status: Option<RefundStatus>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl OrderItem {
    pub fn new(
        product_id: Uuid,
        variant_id: Option<Uuid>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            variant_id,
            name: name.into(),
            quantity,
            unit_price,
            status: OrderItemStatus::Pending,
            reason: None,
            refund_amount: None,
            refund_status: None,
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            returned_at: None,
        }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    fn stamp(&mut self, status: OrderItemStatus, at: DateTime<Utc>) {
        match status {
            OrderItemStatus::Confirmed => self.confirmed_at = Some(at),
            OrderItemStatus::Shipped => self.shipped_at = Some(at),
            OrderItemStatus::Delivered => self.delivered_at = Some(at),
            OrderItemStatus::Cancelled => self.cancelled_at = Some(at),
            OrderItemStatus::Returned => self.returned_at = Some(at),
            _ => {}
        }
    }
}

#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    order_number: String,
    session_id: String,
    customer_email: String,
    items: Vec<OrderItem>,
    subtotal: Money,
    tax: Money,
    shipping: Money,
    discount: Money,
    total: Money,
    coupon_code: Option<String>,
    shipping_address: Address,
    payment_method: Option<String>,
    payment: PaymentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Order {
    /// Create a new order from a priced cart. Items start `Pending`.
    #[allow(clippy::too_many_arguments)]
    pub fn place(
        order_number: impl Into<String>,
        session_id: impl Into<String>,
        customer_email: impl Into<String>,
        items: Vec<OrderItem>,
        breakdown: &PriceBreakdown,
        coupon_code: Option<String>,
        shipping_address: Address,
        payment_method: impl Into<String>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        let id = Uuid::new_v4();
        let order_number = order_number.into();
        let now = Utc::now();
        let mut order = Self {
            id,
            order_number: order_number.clone(),
            session_id: session_id.into(),
            customer_email: customer_email.into(),
            items,
            subtotal: Money::usd(breakdown.subtotal),
            tax: Money::usd(breakdown.tax),
            shipping: Money::usd(breakdown.shipping),
            discount: Money::usd(breakdown.discount),
            total: Money::usd(breakdown.total),
            coupon_code,
            shipping_address,
            payment_method: Some(payment_method.into()),
            payment: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        order.events.push(DomainEvent::OrderPlaced { order_id: id, order_number, total: breakdown.total });
        Ok(order)
    }

    /// Rebuild the aggregate from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        order_number: String,
        session_id: String,
        customer_email: String,
        items: Vec<OrderItem>,
        totals: (Money, Money, Money, Money, Money),
        coupon_code: Option<String>,
        shipping_address: Address,
        payment_method: Option<String>,
        payment: PaymentStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let (subtotal, tax, shipping, discount, total) = totals;
        Self {
            id,
            order_number,
            session_id,
            customer_email,
            items,
            subtotal,
            tax,
            shipping,
            discount,
            total,
            coupon_code,
            shipping_address,
            payment_method,
            payment,
            created_at,
            updated_at,
            events: vec![],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn order_number(&self) -> &str {
        &self.order_number
    }
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }
    pub fn subtotal(&self) -> &Money {
        &self.subtotal
    }
    pub fn tax(&self) -> &Money {
        &self.tax
    }
    pub fn shipping(&self) -> &Money {
        &self.shipping
    }
    pub fn discount(&self) -> &Money {
        &self.discount
    }
    pub fn total(&self) -> &Money {
        &self.total
    }
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }
    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }
    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }
    pub fn payment(&self) -> PaymentStatus {
        self.payment
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn mark_paid(&mut self) {
        self.payment = PaymentStatus::Paid;
        self.touch();
    }

    /// Move the given items to `target`.
    ///
    /// Items already at `target` are skipped silently. Any illegal edge fails
    /// the whole request before anything mutates. Entering `Returned`, or
    /// `Cancelled` on a paid order, opens a refund for the item's line total.
    /// Returns the number of items actually changed.
    pub fn transition_items(
        &mut self,
        target: OrderItemStatus,
        item_ids: &[Uuid],
        reason: Option<&Reason>,
    ) -> Result<usize, OrderError> {
        if target.requires_reason() && reason.is_none() {
            return Err(OrderError::ReasonRequired(target));
        }
        for id in item_ids {
            let item = self.items.iter().find(|i| i.id == *id).ok_or(OrderError::ItemNotFound(*id))?;
            if item.status != target && !item.status.can_transition_to(target) {
                return Err(OrderError::IllegalTransition { from: item.status, to: target });
            }
        }

        let now = Utc::now();
        let paid = self.payment == PaymentStatus::Paid;
        let order_id = self.id;
        let mut raised = Vec::new();
        let mut changed = 0;
        for id in item_ids {
            let Some(item) = self.items.iter_mut().find(|i| i.id == *id) else { continue };
            let from = item.status;
            if from == target {
                continue;
            }
            item.status = target;
            item.stamp(target, now);
            if target.requires_reason() {
                item.reason = reason.map(|r| r.as_str().to_string());
            }
            if target == OrderItemStatus::Returned || (target == OrderItemStatus::Cancelled && paid) {
                let amount = item.line_total();
                item.refund_amount = Some(amount.clone());
                item.refund_status = Some(RefundStatus::Pending);
                raised.push(DomainEvent::RefundOpened { order_id, item_id: item.id, amount: amount.amount() });
            }
            raised.push(DomainEvent::ItemStatusChanged {
                order_id,
                item_id: item.id,
                from,
                to: target,
                reason: item.reason.clone(),
            });
            changed += 1;
        }
        self.events.extend(raised);
        if changed > 0 {
            self.touch();
        }
        Ok(changed)
    }

    /// Close an open refund; the only path into the `Refunded` status.
    pub fn complete_refund(&mut self, item_id: Uuid) -> Result<(), OrderError> {
        let order_id = self.id;
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(OrderError::ItemNotFound(item_id))?;
        if item.refund_status != Some(RefundStatus::Pending) {
            return Err(OrderError::NoOpenRefund(item_id));
        }
        item.refund_status = Some(RefundStatus::Completed);
        item.status = OrderItemStatus::Refunded;
        self.events.push(DomainEvent::RefundCompleted { order_id, item_id });
        if self.items.iter().all(|i| i.refund_status == Some(RefundStatus::Completed)) {
            self.payment = PaymentStatus::Refunded;
        }
        self.touch();
        Ok(())
    }

    /// Display roll-up for the order header; individual items remain the
    /// authoritative state. The least-advanced active item wins; an order
    /// with only terminal items shows its most advanced terminal state.
    pub fn derived_status(&self) -> OrderItemStatus {
        fn rank(s: OrderItemStatus) -> u8 {
            use OrderItemStatus::*;
            match s {
                Pending => 0,
                Confirmed => 1,
                Processing => 2,
                Packed => 3,
                Shipped => 4,
                OutForDelivery => 5,
                Failed => 6,
                Delivered => 7,
                ReturnRequested => 8,
                Cancelled => 9,
                Returned => 10,
                Refunded => 11,
            }
        }
        let active = self.items.iter().map(|i| i.status).filter(|s| !s.is_terminal());
        if let Some(status) = active.min_by_key(|s| rank(*s)) {
            return status;
        }
        self.items
            .iter()
            .map(|i| i.status)
            .max_by_key(|s| rank(*s))
            .unwrap_or(OrderItemStatus::Pending)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderError {
    #[error("order has no items")]
    NoItems,
    #[error("order item {0} not found")]
    ItemNotFound(Uuid),
    #[error("a reason is required when moving items to {0}")]
    ReasonRequired(OrderItemStatus),
    #[error("status change from {from} to {to} is not permitted")]
    IllegalTransition { from: OrderItemStatus, to: OrderItemStatus },
    #[error("item {0} has no open refund")]
    NoOpenRefund(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::{PriceBreakdown, PricedLine, DEFAULT_SHIPPING_FEE};
    use rust_decimal::Decimal;

    fn test_order() -> Order {
        let items = vec![
            OrderItem::new(Uuid::new_v4(), None, "Widget", 2, Money::usd(Decimal::new(10, 0))),
            OrderItem::new(Uuid::new_v4(), None, "Gadget", 1, Money::usd(Decimal::new(5, 0))),
        ];
        let lines: Vec<PricedLine> = items
            .iter()
            .map(|i| PricedLine {
                unit_price: i.unit_price.amount(),
                offer_price: None,
                quantity: i.quantity,
                stock: 100,
            })
            .collect();
        let breakdown = PriceBreakdown::compute(&lines, None, DEFAULT_SHIPPING_FEE);
        Order::place(
            "ORD-00000001",
            "sess-1",
            "shopper@example.com",
            items,
            &breakdown,
            None,
            Address::default(),
            "card",
        )
        .unwrap()
    }

    #[test]
    fn placing_requires_items() {
        let breakdown = PriceBreakdown::compute(&[], None, DEFAULT_SHIPPING_FEE);
        let err = Order::place("ORD-1", "s", "a@b.c", vec![], &breakdown, None, Address::default(), "card");
        assert!(matches!(err, Err(OrderError::NoItems)));
    }

    #[test]
    fn confirm_stamps_timestamp() {
        let mut order = test_order();
        let ids: Vec<Uuid> = order.items().iter().map(|i| i.id).collect();
        let changed = order.transition_items(OrderItemStatus::Confirmed, &ids, None).unwrap();
        assert_eq!(changed, 2);
        assert!(order.items().iter().all(|i| i.status == OrderItemStatus::Confirmed));
        assert!(order.items().iter().all(|i| i.confirmed_at.is_some()));
    }

    #[test]
    fn same_status_is_silent_noop() {
        let mut order = test_order();
        let ids: Vec<Uuid> = order.items().iter().map(|i| i.id).collect();
        let changed = order.transition_items(OrderItemStatus::Pending, &ids, None).unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn illegal_jump_rejected_and_nothing_mutates() {
        let mut order = test_order();
        let ids: Vec<Uuid> = order.items().iter().map(|i| i.id).collect();
        let err = order.transition_items(OrderItemStatus::Delivered, &ids, None);
        assert!(matches!(err, Err(OrderError::IllegalTransition { .. })));
        assert!(order.items().iter().all(|i| i.status == OrderItemStatus::Pending));
    }

    #[test]
    fn cancel_requires_reason() {
        let mut order = test_order();
        let ids: Vec<Uuid> = order.items().iter().map(|i| i.id).collect();
        let err = order.transition_items(OrderItemStatus::Cancelled, &ids, None);
        assert!(matches!(err, Err(OrderError::ReasonRequired(OrderItemStatus::Cancelled))));
        let reason = Reason::new("changed my mind").unwrap();
        order.transition_items(OrderItemStatus::Cancelled, &ids, Some(&reason)).unwrap();
        assert!(order.items().iter().all(|i| i.reason.as_deref() == Some("changed my mind")));
        assert!(order.items().iter().all(|i| i.cancelled_at.is_some()));
    }

    #[test]
    fn cancel_before_payment_opens_no_refund() {
        let mut order = test_order();
        let ids = vec![order.items()[0].id];
        let reason = Reason::new("late delivery").unwrap();
        order.transition_items(OrderItemStatus::Cancelled, &ids, Some(&reason)).unwrap();
        assert!(order.items()[0].refund_status.is_none());
    }

    #[test]
    fn cancel_after_payment_opens_refund() {
        let mut order = test_order();
        order.mark_paid();
        let ids = vec![order.items()[0].id];
        let reason = Reason::new("late delivery").unwrap();
        order.transition_items(OrderItemStatus::Cancelled, &ids, Some(&reason)).unwrap();
        let item = &order.items()[0];
        assert_eq!(item.refund_status, Some(RefundStatus::Pending));
        assert_eq!(item.refund_amount.as_ref().unwrap().amount(), Decimal::new(20, 0));
    }

    #[test]
    fn return_flow_ends_in_refunded() {
        let mut order = test_order();
        order.mark_paid();
        let ids: Vec<Uuid> = order.items().iter().map(|i| i.id).collect();
        for step in [
            OrderItemStatus::Confirmed,
            OrderItemStatus::Processing,
            OrderItemStatus::Packed,
            OrderItemStatus::Shipped,
            OrderItemStatus::OutForDelivery,
            OrderItemStatus::Delivered,
        ] {
            order.transition_items(step, &ids, None).unwrap();
        }
        let reason = Reason::new("wrong size").unwrap();
        order.transition_items(OrderItemStatus::ReturnRequested, &ids, Some(&reason)).unwrap();
        order.transition_items(OrderItemStatus::Returned, &ids, Some(&reason)).unwrap();
        assert!(order.items().iter().all(|i| i.refund_status == Some(RefundStatus::Pending)));

        let first = order.items()[0].id;
        order.complete_refund(first).unwrap();
        assert_eq!(order.items()[0].status, OrderItemStatus::Refunded);
        assert!(order.complete_refund(first).is_err());
    }

    #[test]
    fn derived_status_rolls_up() {
        let mut order = test_order();
        assert_eq!(order.derived_status(), OrderItemStatus::Pending);
        let first = order.items()[0].id;
        order.transition_items(OrderItemStatus::Confirmed, &[first], None).unwrap();
        // One item still pending, so the header stays at the least-advanced stage.
        assert_eq!(order.derived_status(), OrderItemStatus::Pending);
        let reason = Reason::new("out of budget").unwrap();
        let all: Vec<Uuid> = order.items().iter().map(|i| i.id).collect();
        order.transition_items(OrderItemStatus::Cancelled, &all, Some(&reason)).unwrap();
        assert_eq!(order.derived_status(), OrderItemStatus::Cancelled);
    }

    #[test]
    fn events_are_raised_and_drained() {
        let mut order = test_order();
        order.mark_paid();
        let ids = vec![order.items()[0].id];
        let reason = Reason::new("damaged").unwrap();
        order.transition_items(OrderItemStatus::Cancelled, &ids, Some(&reason)).unwrap();
        let events = order.take_events();
        // OrderPlaced + RefundOpened + ItemStatusChanged
        assert_eq!(events.len(), 3);
        assert!(order.take_events().is_empty());
    }
}
