//! Product catalog endpoints.

use anyhow::anyhow;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::{check, page_bounds, ListParams, Paginated};
use crate::domain::value_objects::Sku;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::{ProductRow, VariantRow};

pub async fn list(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<Paginated<ProductRow>>> {
    let (page, limit, offset) = page_bounds(p.page, p.per_page);
    let (rows, total) = match p.category {
        Some(category) => {
            let rows = sqlx::query_as::<_, ProductRow>(
                "SELECT * FROM products WHERE status = 'active' AND category_id = $3 \
                 ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .bind(category)
            .fetch_all(&s.db)
            .await?;
            let total: (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM products WHERE status = 'active' AND category_id = $1")
                    .bind(category)
                    .fetch_one(&s.db)
                    .await?;
            (rows, total.0)
        }
        None => {
            let rows = sqlx::query_as::<_, ProductRow>(
                "SELECT * FROM products WHERE status = 'active' ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&s.db)
            .await?;
            let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE status = 'active'")
                .fetch_one(&s.db)
                .await?;
            (rows, total.0)
        }
    };
    Ok(Json(Paginated { data: rows, total, page }))
}

/// Detail view with the variant-resolved display price and stock.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductRow,
    pub variants: Vec<VariantRow>,
    pub effective_price: Decimal,
    pub effective_stock: u32,
    pub in_stock: bool,
}

pub async fn get(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ProductDetail>> {
    let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    let variants = sqlx::query_as::<_, VariantRow>("SELECT * FROM product_variants WHERE product_id = $1")
        .bind(id)
        .fetch_all(&s.db)
        .await?;
    let product = row.clone().into_domain(variants.clone())?;
    let display_variant = product.variants().first();
    Ok(Json(ProductDetail {
        effective_price: product.effective_price(display_variant).amount(),
        effective_stock: product.effective_stock(display_variant),
        in_stock: product.is_in_stock(display_variant),
        product: row,
        variants,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub offer_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
}

fn check_prices(r: &UpsertProductRequest) -> Result<()> {
    if r.price <= Decimal::ZERO {
        return Err(AppError::Validation("price must be positive".into()));
    }
    if let Some(offer) = r.offer_price {
        if offer <= Decimal::ZERO || offer > r.price {
            return Err(AppError::Validation("offer price must be positive and not exceed the price".into()));
        }
    }
    Ok(())
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<UpsertProductRequest>,
) -> Result<(StatusCode, Json<ProductRow>)> {
    check(&r)?;
    check_prices(&r)?;
    let sku = Sku::new(format!("SKU-{:08}", rand::random::<u32>()))
        .map_err(|e| AppError::Internal(anyhow!("{e}")))?;
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products (id, sku, name, description, price, offer_price, category_id, stock, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(sku.as_str())
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.price)
    .bind(r.offer_price)
    .bind(r.category_id)
    .bind(r.stock.unwrap_or(0))
    .fetch_one(&s.db)
    .await?;
    tracing::info!(product = %row.id, sku = %row.sku, "product created");
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpsertProductRequest>,
) -> Result<Json<ProductRow>> {
    check(&r)?;
    check_prices(&r)?;
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products SET name = $2, description = $3, price = $4, offer_price = $5, \
                category_id = $6, stock = $7, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.name)
    .bind(&r.description)
    .bind(r.price)
    .bind(r.offer_price)
    .bind(r.category_id)
    .bind(r.stock.unwrap_or(0))
    .fetch_optional(&s.db)
    .await?
    .ok_or(AppError::NotFound("product"))?;
    Ok(Json(row))
}

/// Archive rather than delete; order history keeps pointing at the row.
pub async fn remove(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let result = sqlx::query("UPDATE products SET status = 'archived', updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("product"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVariantRequest {
    #[validate(length(max = 50))]
    pub color: Option<String>,
    #[validate(length(max = 50))]
    pub size: Option<String>,
    pub price: Option<Decimal>,
    pub offer_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
}

pub async fn create_variant(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<CreateVariantRequest>,
) -> Result<(StatusCode, Json<VariantRow>)> {
    check(&r)?;
    if let Some(price) = r.price {
        if price <= Decimal::ZERO {
            return Err(AppError::Validation("variant price must be positive".into()));
        }
    }
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("product"));
    }
    let row = sqlx::query_as::<_, VariantRow>(
        "INSERT INTO product_variants (id, product_id, color, size, price, offer_price, stock) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(id)
    .bind(&r.color)
    .bind(&r.size)
    .bind(r.price)
    .bind(r.offer_price)
    .bind(r.stock)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}
