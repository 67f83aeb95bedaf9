//! Back-office endpoints: entity tables with in-memory substring search,
//! user moderation, and coupon management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::admin::{filter, AdminRecord};
use crate::api::check;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::{CategoryRow, CouponRow, OrderRow, ProductRow, ReviewRow, UserRow};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

fn searched(records: Vec<AdminRecord>, p: &SearchParams) -> Vec<AdminRecord> {
    filter(records, p.search.as_deref().unwrap_or(""))
}

pub async fn list_users(
    State(s): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<AdminRecord>>> {
    let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(searched(rows.into_iter().map(AdminRecord::User).collect(), &p)))
}

pub async fn list_categories(
    State(s): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<AdminRecord>>> {
    let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(searched(rows.into_iter().map(AdminRecord::Category).collect(), &p)))
}

pub async fn list_coupons(
    State(s): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<AdminRecord>>> {
    let rows = sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(searched(rows.into_iter().map(AdminRecord::Coupon).collect(), &p)))
}

pub async fn list_products(
    State(s): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<AdminRecord>>> {
    let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(searched(rows.into_iter().map(AdminRecord::Product).collect(), &p)))
}

pub async fn list_orders(
    State(s): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<AdminRecord>>> {
    let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(searched(rows.into_iter().map(AdminRecord::Order).collect(), &p)))
}

pub async fn list_reviews(
    State(s): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<AdminRecord>>> {
    let rows = sqlx::query_as::<_, ReviewRow>("SELECT * FROM reviews ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(searched(rows.into_iter().map(AdminRecord::Review).collect(), &p)))
}

async fn set_banned(s: &AppState, id: Uuid, banned: bool) -> Result<()> {
    let result = sqlx::query("UPDATE users SET banned = $2 WHERE id = $1")
        .bind(id)
        .bind(banned)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("user"));
    }
    tracing::info!(user = %id, banned, "user moderation change");
    Ok(())
}

pub async fn ban_user(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    set_banned(&s, id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unban_user(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    set_banned(&s, id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertCouponRequest {
    #[validate(length(min = 3, max = 32))]
    pub code: String,
    pub kind: String,
    pub value: Decimal,
    pub max_discount: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub usage_limit: i32,
}

fn check_coupon(r: &UpsertCouponRequest) -> Result<()> {
    if r.kind != "percent" && r.kind != "flat" {
        return Err(AppError::Validation("coupon kind must be percent or flat".into()));
    }
    if r.value <= Decimal::ZERO {
        return Err(AppError::Validation("coupon value must be positive".into()));
    }
    if r.kind == "percent" && r.value > Decimal::ONE_HUNDRED {
        return Err(AppError::Validation("percent coupons cannot exceed 100".into()));
    }
    if r.expires_at <= r.valid_from {
        return Err(AppError::Validation("coupon must expire after it becomes valid".into()));
    }
    Ok(())
}

pub async fn create_coupon(
    State(s): State<AppState>,
    Json(r): Json<UpsertCouponRequest>,
) -> Result<(StatusCode, Json<CouponRow>)> {
    check(&r)?;
    check_coupon(&r)?;
    let row = sqlx::query_as::<_, CouponRow>(
        "INSERT INTO coupons (id, code, kind, value, max_discount, valid_from, expires_at, \
                usage_limit, usage_count, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(r.code.trim().to_uppercase())
    .bind(&r.kind)
    .bind(r.value)
    .bind(r.max_discount)
    .bind(r.valid_from)
    .bind(r.expires_at)
    .bind(r.usage_limit)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_coupon(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpsertCouponRequest>,
) -> Result<Json<CouponRow>> {
    check(&r)?;
    check_coupon(&r)?;
    let row = sqlx::query_as::<_, CouponRow>(
        "UPDATE coupons SET code = $2, kind = $3, value = $4, max_discount = $5, valid_from = $6, \
                expires_at = $7, usage_limit = $8 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(r.code.trim().to_uppercase())
    .bind(&r.kind)
    .bind(r.value)
    .bind(r.max_discount)
    .bind(r.valid_from)
    .bind(r.expires_at)
    .bind(r.usage_limit)
    .fetch_optional(&s.db)
    .await?
    .ok_or(AppError::NotFound("coupon"))?;
    Ok(Json(row))
}

pub async fn delete_coupon(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1").bind(id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("coupon"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_review(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1").bind(id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("review"));
    }
    Ok(StatusCode::NO_CONTENT)
}
