//! Category endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::check;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::CategoryRow;

pub async fn list(State(s): State<AppState>) -> Result<Json<Vec<CategoryRow>>> {
    let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(rows))
}

pub async fn get(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CategoryRow>> {
    sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("category"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

pub async fn create(
    State(s): State<AppState>,
    Json(r): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryRow>)> {
    check(&r)?;
    let slug = r.name.trim().to_lowercase().replace(' ', "-");
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (id, name, slug, created_at) VALUES ($1, $2, $3, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(r.name.trim())
    .bind(&slug)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// Products keep existing without a category when theirs is removed.
pub async fn remove(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let mut tx = s.db.begin().await?;
    sqlx::query("UPDATE products SET category_id = NULL WHERE category_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&mut *tx).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("category"));
    }
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
