//! Wishlist and comparison endpoints; two session-scoped product sets with
//! identical shapes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::SavedItemRow;

#[derive(Clone, Copy)]
enum Kind {
    Wishlist,
    Comparison,
}

async fn items(s: &AppState, kind: Kind, session: &str) -> Result<Vec<SavedItemRow>> {
    let sql = match kind {
        Kind::Wishlist => {
            "SELECT w.id, w.product_id, p.name, COALESCE(p.offer_price, p.price) AS price, w.created_at \
             FROM wishlist_items w JOIN products p ON p.id = w.product_id \
             WHERE w.session_id = $1 ORDER BY w.created_at DESC"
        }
        Kind::Comparison => {
            "SELECT c.id, c.product_id, p.name, COALESCE(p.offer_price, p.price) AS price, c.created_at \
             FROM comparison_items c JOIN products p ON p.id = c.product_id \
             WHERE c.session_id = $1 ORDER BY c.created_at DESC"
        }
    };
    Ok(sqlx::query_as::<_, SavedItemRow>(sql).bind(session).fetch_all(&s.db).await?)
}

#[derive(Debug, Deserialize)]
pub struct AddSavedItemRequest {
    pub product_id: Uuid,
}

async fn add(s: &AppState, kind: Kind, session: &str, product_id: Uuid) -> Result<Vec<SavedItemRow>> {
    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND status = 'active'")
            .bind(product_id)
            .fetch_optional(&s.db)
            .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("product"));
    }
    let sql = match kind {
        Kind::Wishlist => {
            "INSERT INTO wishlist_items (id, session_id, product_id, created_at) \
             VALUES ($1, $2, $3, NOW()) ON CONFLICT (session_id, product_id) DO NOTHING"
        }
        Kind::Comparison => {
            "INSERT INTO comparison_items (id, session_id, product_id, created_at) \
             VALUES ($1, $2, $3, NOW()) ON CONFLICT (session_id, product_id) DO NOTHING"
        }
    };
    sqlx::query(sql).bind(Uuid::now_v7()).bind(session).bind(product_id).execute(&s.db).await?;
    items(s, kind, session).await
}

async fn remove(s: &AppState, kind: Kind, session: &str, product_id: Uuid) -> Result<Vec<SavedItemRow>> {
    let sql = match kind {
        Kind::Wishlist => "DELETE FROM wishlist_items WHERE session_id = $1 AND product_id = $2",
        Kind::Comparison => "DELETE FROM comparison_items WHERE session_id = $1 AND product_id = $2",
    };
    let result = sqlx::query(sql).bind(session).bind(product_id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("saved item"));
    }
    items(s, kind, session).await
}

pub async fn wishlist_list(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<Vec<SavedItemRow>>> {
    Ok(Json(items(&s, Kind::Wishlist, &session).await?))
}

pub async fn wishlist_add(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<AddSavedItemRequest>,
) -> Result<(StatusCode, Json<Vec<SavedItemRow>>)> {
    Ok((StatusCode::CREATED, Json(add(&s, Kind::Wishlist, &session, r.product_id).await?)))
}

pub async fn wishlist_remove(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<SavedItemRow>>> {
    Ok(Json(remove(&s, Kind::Wishlist, &session, product_id).await?))
}

pub async fn comparison_list(
    State(s): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<Vec<SavedItemRow>>> {
    Ok(Json(items(&s, Kind::Comparison, &session).await?))
}

pub async fn comparison_add(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<AddSavedItemRequest>,
) -> Result<(StatusCode, Json<Vec<SavedItemRow>>)> {
    Ok((StatusCode::CREATED, Json(add(&s, Kind::Comparison, &session, r.product_id).await?)))
}

pub async fn comparison_remove(
    State(s): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<SavedItemRow>>> {
    Ok(Json(remove(&s, Kind::Comparison, &session, product_id).await?))
}
