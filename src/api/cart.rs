//! Cart endpoints.
//!
//! The store is authoritative: every mutation is followed by a fresh load of
//! the cart joined with live product data, never a local merge.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::coupons;
use crate::domain::aggregates::cart::MAX_LINE_QUANTITY;
use crate::domain::pricing::PriceBreakdown;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store;
use crate::store::{ProductRow, VariantRow};

#[derive(Debug, Serialize)]
pub struct CartEntryView {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub offer_price: Option<Decimal>,
    pub line_total: Decimal,
    pub stock: u32,
    pub out_of_stock: bool,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub session_id: String,
    pub entries: Vec<CartEntryView>,
    pub breakdown: PriceBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub coupon: Option<String>,
}

pub(crate) async fn view(s: &AppState, session: &str, coupon_code: Option<&str>) -> Result<CartView> {
    let cart = store::load_cart(&s.db, session).await?;
    let coupon = match coupon_code {
        Some(code) => Some(coupons::fetch_redeemable(s, code).await?),
        None => None,
    };
    let breakdown = PriceBreakdown::compute(&cart.priced_lines(), coupon.as_ref(), s.shipping_fee);
    let entries = cart
        .entries()
        .iter()
        .map(|e| CartEntryView {
            product_id: e.product_id,
            variant_id: e.variant_id,
            name: e.name.clone(),
            quantity: e.quantity,
            unit_price: e.unit_price.amount(),
            offer_price: e.offer_price.as_ref().map(|m| m.amount()),
            line_total: e.line_total().amount(),
            stock: e.stock,
            out_of_stock: e.out_of_stock,
        })
        .collect();
    Ok(CartView { session_id: session.to_string(), entries, breakdown })
}

pub async fn get(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Query(q): Query<CartQuery>,
) -> Result<Json<CartView>> {
    Ok(Json(view(&s, &session, q.coupon.as_deref()).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: u32,
}

pub async fn add(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    if r.quantity < 1 {
        return Err(AppError::Validation("quantity must be at least 1".into()));
    }
    let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1 AND status = 'active'")
        .bind(r.product_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    let variants = sqlx::query_as::<_, VariantRow>("SELECT * FROM product_variants WHERE product_id = $1")
        .bind(r.product_id)
        .fetch_all(&s.db)
        .await?;
    let product = row.into_domain(variants)?;
    let variant = match r.variant_id {
        Some(vid) => Some(product.variant(vid).ok_or(AppError::NotFound("variant"))?),
        None => None,
    };
    let stock = product.effective_stock(variant);

    // Lines are keyed by (product, variant); the same product in two variants
    // is two separate lines.
    let existing: Option<(i32,)> = sqlx::query_as(
        "SELECT quantity FROM cart_items \
         WHERE session_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3",
    )
    .bind(&session)
    .bind(r.product_id)
    .bind(r.variant_id)
    .fetch_optional(&s.db)
    .await?;
    let merged = (existing.map(|(q,)| q.max(0) as u32).unwrap_or(0) + r.quantity).min(MAX_LINE_QUANTITY);
    if merged >= stock {
        return Err(AppError::OutOfStock);
    }

    sqlx::query(
        "INSERT INTO cart_items (id, session_id, product_id, variant_id, quantity, created_at) \
         VALUES ($1, $2, $3, $4, $5, NOW()) \
         ON CONFLICT (session_id, product_id, COALESCE(variant_id, '00000000-0000-0000-0000-000000000000'::uuid)) \
         DO UPDATE SET quantity = $5",
    )
    .bind(Uuid::now_v7())
    .bind(&session)
    .bind(r.product_id)
    .bind(r.variant_id)
    .bind(merged as i32)
    .execute(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(view(&s, &session, None).await?)))
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
    pub variant_id: Option<Uuid>,
}

pub async fn set_quantity(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
    Json(r): Json<SetQuantityRequest>,
) -> Result<Json<CartView>> {
    let mut cart = store::load_cart(&s.db, &session).await?;
    let effective = cart.set_quantity(product_id, r.variant_id, r.quantity)?;
    sqlx::query(
        "UPDATE cart_items SET quantity = $3 \
         WHERE session_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $4",
    )
    .bind(&session)
    .bind(product_id)
    .bind(effective as i32)
    .bind(r.variant_id)
    .execute(&s.db)
    .await?;
    Ok(Json(view(&s, &session, None).await?))
}

#[derive(Debug, Deserialize)]
pub struct LineQuery {
    pub variant_id: Option<Uuid>,
}

pub async fn remove(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
    Query(q): Query<LineQuery>,
) -> Result<Json<CartView>> {
    let result = sqlx::query(
        "DELETE FROM cart_items \
         WHERE session_id = $1 AND product_id = $2 AND variant_id IS NOT DISTINCT FROM $3",
    )
    .bind(&session)
    .bind(product_id)
    .bind(q.variant_id)
    .execute(&s.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("cart entry"));
    }
    Ok(Json(view(&s, &session, None).await?))
}

pub async fn clear(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    sqlx::query("DELETE FROM cart_items WHERE session_id = $1").bind(&session).execute(&s.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
