//! Coupon codes with derived availability.
//!
//! A coupon's status is never stored; it is computed from the clock and the
//! usage counter every time it is looked at.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// `value` is a percentage of the subtotal, optionally capped.
    Percent,
    /// `value` is taken off the subtotal directly.
    Flat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CouponStatus {
    Active,
    Expired,
    SoldOut,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    pub max_discount: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub usage_limit: i32,
    pub usage_count: i32,
}

impl Coupon {
    /// Expiry wins over everything else, regardless of usage count.
    pub fn derived_status(&self, now: DateTime<Utc>) -> CouponStatus {
        if now > self.expires_at {
            CouponStatus::Expired
        } else if self.usage_count >= self.usage_limit {
            CouponStatus::SoldOut
        } else {
            CouponStatus::Active
        }
    }

    /// Active and inside the validity window.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.derived_status(now) == CouponStatus::Active && now >= self.valid_from
    }

    /// Discount this coupon would take off the given subtotal. Never exceeds
    /// the subtotal itself.
    pub fn potential_discount(&self, subtotal: Decimal) -> Decimal {
        let raw = match self.kind {
            CouponKind::Percent => (subtotal * self.value / Decimal::ONE_HUNDRED).round_dp(2),
            CouponKind::Flat => self.value,
        };
        let capped = match self.max_discount {
            Some(cap) => raw.min(cap),
            None => raw,
        };
        capped.min(subtotal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(kind: CouponKind, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            code: "SAVE10".into(),
            kind,
            value: Decimal::new(value, 0),
            max_discount: None,
            valid_from: now - Duration::days(1),
            expires_at: now + Duration::days(7),
            usage_limit: 100,
            usage_count: 0,
        }
    }

    #[test]
    fn expiry_wins_over_usage() {
        let mut c = coupon(CouponKind::Percent, 10);
        c.expires_at = Utc::now() - Duration::hours(1);
        c.usage_count = 0;
        assert_eq!(c.derived_status(Utc::now()), CouponStatus::Expired);
        c.usage_count = c.usage_limit;
        assert_eq!(c.derived_status(Utc::now()), CouponStatus::Expired);
    }

    #[test]
    fn sold_out_when_limit_reached() {
        let mut c = coupon(CouponKind::Flat, 5);
        c.usage_count = c.usage_limit;
        assert_eq!(c.derived_status(Utc::now()), CouponStatus::SoldOut);
        assert!(!c.is_redeemable(Utc::now()));
    }

    #[test]
    fn not_redeemable_before_window_opens() {
        let mut c = coupon(CouponKind::Percent, 10);
        c.valid_from = Utc::now() + Duration::days(1);
        assert_eq!(c.derived_status(Utc::now()), CouponStatus::Active);
        assert!(!c.is_redeemable(Utc::now()));
    }

    #[test]
    fn percent_discount_respects_cap() {
        let mut c = coupon(CouponKind::Percent, 20);
        assert_eq!(c.potential_discount(Decimal::new(200, 0)), Decimal::new(40, 0));
        c.max_discount = Some(Decimal::new(25, 0));
        assert_eq!(c.potential_discount(Decimal::new(200, 0)), Decimal::new(25, 0));
    }

    #[test]
    fn flat_discount_clamped_to_subtotal() {
        let c = coupon(CouponKind::Flat, 50);
        assert_eq!(c.potential_discount(Decimal::new(30, 0)), Decimal::new(30, 0));
        assert_eq!(c.potential_discount(Decimal::new(80, 0)), Decimal::new(50, 0));
    }
}
