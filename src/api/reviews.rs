//! Product review endpoints. Shoppers write them; admins moderate them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::check;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::ReviewRow;

pub async fn list_for_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReviewRow>>> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC",
    )
    .bind(id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, max = 100))]
    pub author: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(min = 1, max = 2000))]
    pub comment: String,
}

pub async fn create(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewRow>)> {
    check(&r)?;
    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND status = 'active'")
            .bind(id)
            .fetch_optional(&s.db)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("product"));
    }
    let row = sqlx::query_as::<_, ReviewRow>(
        "INSERT INTO reviews (id, product_id, author, rating, comment, created_at) \
         VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(id)
    .bind(r.author.trim())
    .bind(r.rating)
    .bind(r.comment.trim())
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}
