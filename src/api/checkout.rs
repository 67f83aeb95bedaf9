//! Checkout: price the cart, place the order, decrement stock, clear the
//! cart, all inside one transaction. Events and mail go out after commit.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::api::{check, orders};
use crate::api::coupons;
use crate::domain::aggregates::order::{Address, Order, OrderItem};
use crate::domain::pricing::PriceBreakdown;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(email)]
    pub customer_email: String,
    pub coupon_code: Option<String>,
    pub shipping_address: Address,
    #[validate(length(min = 1))]
    pub payment_method: String,
}

fn check_address(a: &Address) -> Result<()> {
    for (field, value) in [
        ("name", &a.name),
        ("street1", &a.street1),
        ("city", &a.city),
        ("zip", &a.zip),
        ("country", &a.country),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("shipping address {field} is required")));
        }
    }
    Ok(())
}

pub async fn checkout(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<orders::OrderDetailView>)> {
    check(&r)?;
    check_address(&r.shipping_address)?;

    let banned: Option<(bool,)> = sqlx::query_as("SELECT banned FROM users WHERE email = $1")
        .bind(&r.customer_email)
        .fetch_optional(&s.db)
        .await?;
    if banned.map(|(b,)| b).unwrap_or(false) {
        return Err(AppError::Banned);
    }

    let cart = store::load_cart(&s.db, &session).await?;
    if cart.entries().is_empty() {
        return Err(AppError::Validation("cart is empty".into()));
    }

    let coupon = match r.coupon_code.as_deref() {
        Some(code) => Some(coupons::fetch_redeemable(&s, code).await?),
        None => None,
    };
    let breakdown = PriceBreakdown::compute(&cart.priced_lines(), coupon.as_ref(), s.shipping_fee);
    if breakdown.checkout_blocked {
        return Err(AppError::OutOfStock);
    }

    let items: Vec<OrderItem> = cart
        .entries()
        .iter()
        .map(|e| {
            OrderItem::new(e.product_id, e.variant_id, e.name.clone(), e.quantity, e.effective_price().clone())
        })
        .collect();
    let order_number = format!("ORD-{:08}", rand::random::<u32>());
    let mut order = Order::place(
        order_number,
        session.clone(),
        r.customer_email.clone(),
        items,
        &breakdown,
        coupon.as_ref().map(|c| c.code.clone()),
        r.shipping_address,
        r.payment_method.clone(),
    )?;

    let mut tx = s.db.begin().await?;
    sqlx::query(
        "INSERT INTO orders (id, order_number, session_id, customer_email, status, subtotal, tax, \
                shipping, discount, total, coupon_code, shipping_address, payment_method, payment_status, \
                created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(order.id())
    .bind(order.order_number())
    .bind(order.session_id())
    .bind(order.customer_email())
    .bind(order.derived_status().label())
    .bind(order.subtotal().amount())
    .bind(order.tax().amount())
    .bind(order.shipping().amount())
    .bind(order.discount().amount())
    .bind(order.total().amount())
    .bind(order.coupon_code())
    .bind(
        serde_json::to_value(order.shipping_address())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("address serialization failed: {e}")))?,
    )
    .bind(order.payment_method())
    .bind(order.payment().as_str())
    .bind(order.created_at())
    .bind(order.updated_at())
    .execute(&mut *tx)
    .await?;

    for item in order.items() {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, variant_id, name, quantity, unit_price, \
                    status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())",
        )
        .bind(item.id)
        .bind(order.id())
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(&item.name)
        .bind(item.quantity as i32)
        .bind(item.unit_price.amount())
        .bind(item.status.label())
        .execute(&mut *tx)
        .await?;

        // Variant stock when the variant tracks its own, otherwise the product's.
        let mut decremented = 0;
        if let Some(variant_id) = item.variant_id {
            decremented = sqlx::query(
                "UPDATE product_variants SET stock = stock - $2 WHERE id = $1 AND stock IS NOT NULL",
            )
            .bind(variant_id)
            .bind(item.quantity as i32)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        if decremented == 0 {
            sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1")
                .bind(item.product_id)
                .bind(item.quantity as i32)
                .execute(&mut *tx)
                .await?;
        }
    }

    if let Some(coupon) = &coupon {
        sqlx::query("UPDATE coupons SET usage_count = usage_count + 1 WHERE code = $1")
            .bind(&coupon.code)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM cart_items WHERE session_id = $1").bind(&session).execute(&mut *tx).await?;
    tx.commit().await?;

    for event in order.take_events() {
        s.publish(&event).await;
    }
    s.send_mail(
        order.customer_email(),
        &format!("Order {} confirmed", order.order_number()),
        &format!(
            "Thank you for your order {}. Your total is {} {}.",
            order.order_number(),
            order.total().amount(),
            order.total().currency(),
        ),
    )
    .await;
    tracing::info!(order = %order.id(), number = %order.order_number(), "order placed");

    Ok((StatusCode::CREATED, Json(orders::detail_view(&s, order.id()).await?)))
}
