//! Coupon lookup. Status is derived at read time; nothing here writes.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::coupon::{Coupon, CouponKind, CouponStatus};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::CouponRow;

#[derive(Debug, Serialize)]
pub struct CouponView {
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    pub max_discount: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: CouponStatus,
    /// Present when the caller supplied `?subtotal=`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub subtotal: Option<Decimal>,
}

pub async fn lookup(
    State(s): State<AppState>,
    Path(code): Path<String>,
    Query(p): Query<LookupParams>,
) -> Result<Json<CouponView>> {
    let row = sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE code = $1")
        .bind(code.trim().to_uppercase())
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("coupon"))?;
    let coupon = row.into_domain()?;
    Ok(Json(CouponView {
        status: coupon.derived_status(Utc::now()),
        discount: p.subtotal.map(|sub| coupon.potential_discount(sub)),
        code: coupon.code,
        kind: coupon.kind,
        value: coupon.value,
        max_discount: coupon.max_discount,
        valid_from: coupon.valid_from,
        expires_at: coupon.expires_at,
    }))
}

/// Fetch a coupon and insist it can be redeemed right now.
pub(crate) async fn fetch_redeemable(s: &AppState, code: &str) -> Result<Coupon> {
    let row = sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE code = $1")
        .bind(code.trim().to_uppercase())
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("coupon"))?;
    let coupon = row.into_domain()?;
    let now = Utc::now();
    if !coupon.is_redeemable(now) {
        return Err(match coupon.derived_status(now) {
            CouponStatus::Expired => AppError::CouponUnusable("expired"),
            CouponStatus::SoldOut => AppError::CouponUnusable("sold out"),
            CouponStatus::Active => AppError::CouponUnusable("not yet valid"),
        });
    }
    Ok(coupon)
}
