//! Persistence rows and hydration into domain aggregates.
//!
//! Handlers query with inline SQL into these `FromRow` structs; anything that
//! carries business rules is lifted into an aggregate before it is touched.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::aggregates::cart::{Cart, CartEntry};
use crate::domain::aggregates::order::{Address, Order, OrderItem, PaymentStatus, RefundStatus};
use crate::domain::aggregates::product::{Product, ProductStatus, Variant};
use crate::domain::coupon::{Coupon, CouponKind};
use crate::domain::status::OrderItemStatus;
use crate::domain::value_objects::{Money, Quantity, Sku};
use crate::error::{AppError, Result};

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub offer_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub stock: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct VariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub color: Option<String>,
    pub size: Option<String>,
    pub price: Option<Decimal>,
    pub offer_price: Option<Decimal>,
    pub stock: Option<i32>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CouponRow {
    pub id: Uuid,
    pub code: String,
    pub kind: String,
    pub value: Decimal,
    pub max_discount: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub usage_limit: i32,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Cart line joined with its product and optional variant.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CartJoinRow {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub offer_price: Option<Decimal>,
    pub base_stock: i32,
    pub v_price: Option<Decimal>,
    pub v_offer: Option<Decimal>,
    pub v_stock: Option<i32>,
}

/// A wishlist or comparison line; both tables share this shape.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct SavedItemRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub session_id: String,
    pub customer_email: String,
    pub status: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub coupon_code: Option<String>,
    pub shipping_address: serde_json::Value,
    pub payment_method: Option<String>,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub status: String,
    pub reason: Option<String>,
    pub refund_amount: Option<Decimal>,
    pub refund_status: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub author: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl CouponRow {
    pub fn into_domain(self) -> Result<Coupon> {
        let kind = match self.kind.as_str() {
            "percent" => CouponKind::Percent,
            "flat" => CouponKind::Flat,
            other => return Err(AppError::Internal(anyhow!("unknown coupon kind in store: {other}"))),
        };
        Ok(Coupon {
            code: self.code,
            kind,
            value: self.value,
            max_discount: self.max_discount,
            valid_from: self.valid_from,
            expires_at: self.expires_at,
            usage_limit: self.usage_limit,
            usage_count: self.usage_count,
        })
    }
}

impl VariantRow {
    pub fn into_domain(self) -> Variant {
        Variant {
            id: self.id,
            color: self.color,
            size: self.size,
            price: self.price.map(Money::usd),
            offer_price: self.offer_price.map(Money::usd),
            stock: self.stock.map(|s| s.max(0) as u32),
        }
    }
}

impl ProductRow {
    pub fn into_domain(self, variants: Vec<VariantRow>) -> Result<Product> {
        let sku = Sku::new(&self.sku).map_err(|e| AppError::Internal(anyhow!("bad stored sku: {e}")))?;
        let status = ProductStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(anyhow!("unknown product status in store: {}", self.status)))?;
        Ok(Product::from_parts(
            self.id,
            sku,
            self.name,
            self.description,
            Money::usd(self.price),
            self.offer_price.map(Money::usd),
            Quantity::new(self.stock.max(0) as u32),
            status,
            variants.into_iter().map(VariantRow::into_domain).collect(),
            self.created_at,
            self.updated_at,
        ))
    }
}

impl OrderItemRow {
    pub fn into_domain(self) -> Result<OrderItem> {
        let status: OrderItemStatus = self.status.parse().map_err(|e| AppError::Internal(anyhow!("{e}")))?;
        let refund_status = match self.refund_status.as_deref() {
            None => None,
            Some(s) => Some(
                RefundStatus::parse(s)
                    .ok_or_else(|| AppError::Internal(anyhow!("unknown refund status in store: {s}")))?,
            ),
        };
        Ok(OrderItem {
            id: self.id,
            product_id: self.product_id,
            variant_id: self.variant_id,
            name: self.name,
            quantity: self.quantity.max(0) as u32,
            unit_price: Money::usd(self.unit_price),
            status,
            reason: self.reason,
            refund_amount: self.refund_amount.map(Money::usd),
            refund_status,
            confirmed_at: self.confirmed_at,
            shipped_at: self.shipped_at,
            delivered_at: self.delivered_at,
            cancelled_at: self.cancelled_at,
            returned_at: self.returned_at,
        })
    }
}

/// Load a session's cart joined with live product data. The out-of-stock flag
/// is recomputed on every load; it is never persisted.
pub async fn load_cart(db: &PgPool, session_id: &str) -> Result<Cart> {
    let rows = sqlx::query_as::<_, CartJoinRow>(
        "SELECT ci.product_id, ci.variant_id, ci.quantity, p.name, p.price, p.offer_price, \
                p.stock AS base_stock, v.price AS v_price, v.offer_price AS v_offer, v.stock AS v_stock \
         FROM cart_items ci \
         JOIN products p ON p.id = ci.product_id \
         LEFT JOIN product_variants v ON v.id = ci.variant_id \
         WHERE ci.session_id = $1 \
         ORDER BY ci.created_at",
    )
    .bind(session_id)
    .fetch_all(db)
    .await?;

    let entries = rows
        .into_iter()
        .map(|r| {
            let quantity = r.quantity.max(0) as u32;
            let stock = r.v_stock.unwrap_or(r.base_stock).max(0) as u32;
            CartEntry {
                product_id: r.product_id,
                variant_id: r.variant_id,
                name: r.name,
                quantity,
                unit_price: Money::usd(r.v_price.unwrap_or(r.price)),
                offer_price: r.v_offer.or(r.offer_price).map(Money::usd),
                stock,
                out_of_stock: quantity >= stock,
            }
        })
        .collect();
    Ok(Cart::new(session_id, entries))
}

pub async fn fetch_order_row(db: &PgPool, id: Uuid) -> Result<OrderRow> {
    sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("order"))
}

pub async fn fetch_order_items(db: &PgPool, order_id: Uuid) -> Result<Vec<OrderItemRow>> {
    Ok(sqlx::query_as::<_, OrderItemRow>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at",
    )
    .bind(order_id)
    .fetch_all(db)
    .await?)
}

/// Rebuild the order aggregate from its rows.
pub async fn load_order(db: &PgPool, id: Uuid) -> Result<Order> {
    let row = fetch_order_row(db, id).await?;
    let item_rows = fetch_order_items(db, id).await?;
    let items = item_rows.into_iter().map(OrderItemRow::into_domain).collect::<Result<Vec<_>>>()?;
    let address: Address = serde_json::from_value(row.shipping_address)
        .map_err(|e| AppError::Internal(anyhow!("bad stored shipping address: {e}")))?;
    let payment = PaymentStatus::parse(&row.payment_status)
        .ok_or_else(|| AppError::Internal(anyhow!("unknown payment status in store: {}", row.payment_status)))?;
    Ok(Order::from_parts(
        row.id,
        row.order_number,
        row.session_id,
        row.customer_email,
        items,
        (
            Money::usd(row.subtotal),
            Money::usd(row.tax),
            Money::usd(row.shipping),
            Money::usd(row.discount),
            Money::usd(row.total),
        ),
        row.coupon_code,
        address,
        row.payment_method,
        payment,
        row.created_at,
        row.updated_at,
    ))
}

/// Write the mutated items and the order header roll-up back in one
/// transaction scope.
pub async fn persist_order_state(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
    for item in order.items() {
        sqlx::query(
            "UPDATE order_items SET status = $2, reason = $3, refund_amount = $4, refund_status = $5, \
                    confirmed_at = $6, shipped_at = $7, delivered_at = $8, cancelled_at = $9, returned_at = $10 \
             WHERE id = $1",
        )
        .bind(item.id)
        .bind(item.status.label())
        .bind(&item.reason)
        .bind(item.refund_amount.as_ref().map(|m| m.amount()))
        .bind(item.refund_status.map(|s| s.as_str()))
        .bind(item.confirmed_at)
        .bind(item.shipped_at)
        .bind(item.delivered_at)
        .bind(item.cancelled_at)
        .bind(item.returned_at)
        .execute(&mut **tx)
        .await?;
    }
    sqlx::query("UPDATE orders SET status = $2, payment_status = $3, updated_at = NOW() WHERE id = $1")
        .bind(order.id())
        .bind(order.derived_status().label())
        .bind(order.payment().as_str())
        .execute(&mut **tx)
        .await?;
    Ok(())
}
