//! Order-item status registry.
//!
//! Every permitted lifecycle edge is hardcoded here; the order aggregate and
//! the HTTP surface both consult this table and nothing else. A status with no
//! successors is terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderItemStatus {
    Pending,
    Confirmed,
    Processing,
    Packed,
    Shipped,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    #[serde(rename = "Return Requested")]
    ReturnRequested,
    Returned,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderItemStatus {
    pub const ALL: [OrderItemStatus; 12] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Packed,
        Self::Shipped,
        Self::OutForDelivery,
        Self::Delivered,
        Self::ReturnRequested,
        Self::Returned,
        Self::Cancelled,
        Self::Refunded,
        Self::Failed,
    ];

    /// Statuses an operator may move an item to from this one, in the order
    /// the dropdown offers them.
    pub fn successors(self) -> &'static [OrderItemStatus] {
        use OrderItemStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Processing, Cancelled],
            Processing => &[Packed, Cancelled],
            Packed => &[Shipped, Cancelled],
            Shipped => &[OutForDelivery],
            OutForDelivery => &[Delivered, Failed],
            Delivered => &[ReturnRequested],
            ReturnRequested => &[Returned, Delivered],
            // A failed delivery can be re-attempted or written off.
            Failed => &[OutForDelivery, Cancelled],
            // Refunded is never operator-selectable; refund completion on the
            // order aggregate is the only path into it.
            Returned | Cancelled | Refunded => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    pub fn can_transition_to(self, next: OrderItemStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Badge colour token the admin console maps to styling.
    pub fn style(self) -> &'static str {
        use OrderItemStatus::*;
        match self {
            Pending => "amber",
            Confirmed | Processing | Packed => "blue",
            Shipped | OutForDelivery => "indigo",
            Delivered => "green",
            ReturnRequested => "orange",
            Returned | Cancelled | Failed => "red",
            Refunded => "purple",
        }
    }

    /// Targets that need a free-text reason from the operator.
    pub fn requires_reason(self) -> bool {
        matches!(self, Self::Cancelled | Self::ReturnRequested | Self::Returned)
    }

    /// Refund-triggering targets the UI must confirm interactively.
    pub fn needs_confirmation(self) -> bool {
        matches!(self, Self::Cancelled | Self::Returned)
    }

    pub fn label(self) -> &'static str {
        use OrderItemStatus::*;
        match self {
            Pending => "Pending",
            Confirmed => "Confirmed",
            Processing => "Processing",
            Packed => "Packed",
            Shipped => "Shipped",
            OutForDelivery => "Out for Delivery",
            Delivered => "Delivered",
            ReturnRequested => "Return Requested",
            Returned => "Returned",
            Cancelled => "Cancelled",
            Refunded => "Refunded",
            Failed => "Failed",
        }
    }
}

impl fmt::Display for OrderItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown order item status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderItemStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_accept_nothing() {
        for status in OrderItemStatus::ALL {
            if status.is_terminal() {
                for next in OrderItemStatus::ALL {
                    assert!(!status.can_transition_to(next), "{status} -> {next}");
                }
            }
        }
    }

    #[test]
    fn terminal_set_is_exact() {
        let terminal: Vec<_> = OrderItemStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![OrderItemStatus::Returned, OrderItemStatus::Cancelled, OrderItemStatus::Refunded]
        );
    }

    #[test]
    fn non_adjacent_jumps_rejected() {
        assert!(!OrderItemStatus::Pending.can_transition_to(OrderItemStatus::Shipped));
        assert!(!OrderItemStatus::Confirmed.can_transition_to(OrderItemStatus::Delivered));
        assert!(!OrderItemStatus::Delivered.can_transition_to(OrderItemStatus::Refunded));
    }

    #[test]
    fn refunded_is_never_a_successor() {
        for status in OrderItemStatus::ALL {
            assert!(!status.successors().contains(&OrderItemStatus::Refunded));
        }
    }

    #[test]
    fn labels_round_trip() {
        for status in OrderItemStatus::ALL {
            assert_eq!(status.label().parse::<OrderItemStatus>().unwrap(), status);
        }
        assert!("Misplaced".parse::<OrderItemStatus>().is_err());
    }

    #[test]
    fn reason_and_confirmation_flags() {
        assert!(OrderItemStatus::Cancelled.requires_reason());
        assert!(OrderItemStatus::ReturnRequested.requires_reason());
        assert!(OrderItemStatus::Returned.requires_reason());
        assert!(!OrderItemStatus::Shipped.requires_reason());
        assert!(OrderItemStatus::Cancelled.needs_confirmation());
        assert!(OrderItemStatus::Returned.needs_confirmation());
        assert!(!OrderItemStatus::ReturnRequested.needs_confirmation());
    }
}
