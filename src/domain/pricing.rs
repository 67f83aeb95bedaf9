//! Checkout pricing aggregation.
//!
//! A pure function from a line-item collection and an optional coupon to a
//! price breakdown. Stock exhaustion is a hard checkout precondition carried
//! on the breakdown, independent of the arithmetic.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::coupon::Coupon;

/// Tax applied to the goods subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Flat shipping fee charged on every order unless overridden by config.
pub const DEFAULT_SHIPPING_FEE: Decimal = Decimal::from_parts(1500, 0, 0, false, 2);

/// One line of a cart or order as the aggregator sees it.
#[derive(Clone, Debug)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub offer_price: Option<Decimal>,
    pub quantity: u32,
    pub stock: u32,
}

impl PricedLine {
    pub fn effective_price(&self) -> Decimal {
        self.offer_price.unwrap_or(self.unit_price)
    }

    /// Requested quantity meeting or exceeding the available stock blocks the
    /// whole checkout.
    pub fn exhausts_stock(&self) -> bool {
        self.quantity >= self.stock
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub checkout_blocked: bool,
}

impl PriceBreakdown {
    pub fn compute(lines: &[PricedLine], coupon: Option<&Coupon>, shipping_fee: Decimal) -> Self {
        let subtotal = lines
            .iter()
            .fold(Decimal::ZERO, |acc, l| acc + l.effective_price() * Decimal::from(l.quantity));
        let tax = (subtotal * TAX_RATE).round_dp(2);
        let discount = coupon.map(|c| c.potential_discount(subtotal)).unwrap_or(Decimal::ZERO);
        let total = (subtotal + tax + shipping_fee - discount).round_dp(2);
        let checkout_blocked = lines.iter().any(PricedLine::exhausts_stock);
        Self { subtotal, tax, shipping: shipping_fee, discount, total, checkout_blocked }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coupon::{Coupon, CouponKind};
    use chrono::{Duration, Utc};

    fn line(price: i64, qty: u32) -> PricedLine {
        PricedLine { unit_price: Decimal::new(price, 0), offer_price: None, quantity: qty, stock: 100 }
    }

    #[test]
    fn breakdown_matches_reference() {
        let lines = vec![line(10, 2), line(5, 1)];
        let b = PriceBreakdown::compute(&lines, None, DEFAULT_SHIPPING_FEE);
        assert_eq!(b.subtotal, Decimal::new(25, 0));
        assert_eq!(b.tax, Decimal::new(200, 2));
        assert_eq!(b.shipping, Decimal::new(1500, 2));
        assert_eq!(b.discount, Decimal::ZERO);
        assert_eq!(b.total, Decimal::new(4200, 2));
        assert!(!b.checkout_blocked);
    }

    #[test]
    fn offer_price_wins_over_unit_price() {
        let lines = vec![PricedLine {
            unit_price: Decimal::new(10, 0),
            offer_price: Some(Decimal::new(8, 0)),
            quantity: 2,
            stock: 100,
        }];
        let b = PriceBreakdown::compute(&lines, None, Decimal::ZERO);
        assert_eq!(b.subtotal, Decimal::new(16, 0));
    }

    #[test]
    fn quantity_meeting_stock_blocks_checkout() {
        let mut exhausted = line(10, 3);
        exhausted.stock = 3;
        let b = PriceBreakdown::compute(&[line(5, 1), exhausted], None, DEFAULT_SHIPPING_FEE);
        assert!(b.checkout_blocked);
        let mut fine = line(10, 2);
        fine.stock = 3;
        let b = PriceBreakdown::compute(&[line(5, 1), fine], None, DEFAULT_SHIPPING_FEE);
        assert!(!b.checkout_blocked);
    }

    #[test]
    fn coupon_discount_flows_into_total() {
        let now = Utc::now();
        let coupon = Coupon {
            code: "TEN".into(),
            kind: CouponKind::Flat,
            value: Decimal::new(10, 0),
            max_discount: None,
            valid_from: now - Duration::days(1),
            expires_at: now + Duration::days(1),
            usage_limit: 10,
            usage_count: 0,
        };
        let b = PriceBreakdown::compute(&[line(10, 2), line(5, 1)], Some(&coupon), DEFAULT_SHIPPING_FEE);
        assert_eq!(b.discount, Decimal::new(10, 0));
        assert_eq!(b.total, Decimal::new(3200, 2));
    }
}
