//! Order endpoints, including the bulk status update that the back-office
//! table drives.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{page_bounds, Paginated};
use crate::domain::status::OrderItemStatus;
use crate::domain::value_objects::Reason;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store;
use crate::store::{OrderItemRow, OrderRow};

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub session: Option<String>,
}

pub async fn list(
    State(s): State<AppState>,
    Query(p): Query<OrderListParams>,
) -> Result<Json<Paginated<OrderRow>>> {
    let (page, limit, offset) = page_bounds(p.page, p.per_page);
    let (rows, total) = match p.session {
        Some(session) => {
            let rows = sqlx::query_as::<_, OrderRow>(
                "SELECT * FROM orders WHERE session_id = $3 ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .bind(&session)
            .fetch_all(&s.db)
            .await?;
            let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE session_id = $1")
                .bind(&session)
                .fetch_one(&s.db)
                .await?;
            (rows, total.0)
        }
        None => {
            let rows = sqlx::query_as::<_, OrderRow>(
                "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&s.db)
            .await?;
            let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders").fetch_one(&s.db).await?;
            (rows, total.0)
        }
    };
    Ok(Json(Paginated { data: rows, total, page }))
}

/// One legal next move for an item, with the hints the back-office needs to
/// render it: badge color, whether to demand a reason, whether to confirm.
#[derive(Debug, Serialize)]
pub struct NextStatus {
    pub label: &'static str,
    pub style: &'static str,
    pub requires_reason: bool,
    pub needs_confirmation: bool,
}

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    #[serde(flatten)]
    pub item: OrderItemRow,
    pub style: &'static str,
    pub next_statuses: Vec<NextStatus>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailView {
    #[serde(flatten)]
    pub order: OrderRow,
    pub items: Vec<OrderItemView>,
}

fn item_view(row: OrderItemRow) -> Result<OrderItemView> {
    let status: OrderItemStatus =
        row.status.parse().map_err(|e| AppError::Internal(anyhow::anyhow!("{e}")))?;
    let next_statuses = status
        .successors()
        .iter()
        .map(|next| NextStatus {
            label: next.label(),
            style: next.style(),
            requires_reason: next.requires_reason(),
            needs_confirmation: next.needs_confirmation(),
        })
        .collect();
    Ok(OrderItemView { style: status.style(), next_statuses, item: row })
}

pub(crate) async fn detail_view(s: &AppState, id: Uuid) -> Result<OrderDetailView> {
    let order = store::fetch_order_row(&s.db, id).await?;
    let items = store::fetch_order_items(&s.db, id)
        .await?
        .into_iter()
        .map(item_view)
        .collect::<Result<Vec<_>>>()?;
    Ok(OrderDetailView { order, items })
}

pub async fn detail(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<OrderDetailView>> {
    Ok(Json(detail_view(&s, id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateRequest {
    pub order_id: Uuid,
    pub status: String,
    pub items_ids: Vec<Uuid>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub updated: usize,
}

/// Move a set of items on one order to a new status.
///
/// All-or-nothing: one illegal edge or missing item fails the whole request.
/// A second request touching any of the same items while this one runs is
/// rejected with a conflict.
pub async fn update_bulk(
    State(s): State<AppState>,
    Json(r): Json<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateResponse>> {
    let target: OrderItemStatus = r.status.parse()?;
    if r.items_ids.is_empty() {
        return Err(AppError::Validation("itemsIds must not be empty".into()));
    }
    let _guard = s.inflight.try_claim(&r.items_ids).map_err(AppError::UpdateInFlight)?;

    let mut order = store::load_order(&s.db, r.order_id).await?;
    let reason = r.reason.as_deref().map(Reason::new).transpose()?;
    let updated = order.transition_items(target, &r.items_ids, reason.as_ref())?;

    let mut tx = s.db.begin().await?;
    store::persist_order_state(&mut tx, &order).await?;
    tx.commit().await?;

    for event in order.take_events() {
        s.publish(&event).await;
    }
    tracing::info!(order = %r.order_id, status = target.label(), updated, "bulk status update");
    Ok(Json(BulkUpdateResponse { updated }))
}

pub async fn mark_paid(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<OrderDetailView>> {
    let mut order = store::load_order(&s.db, id).await?;
    // Payment persists every item row, so it contends with bulk updates.
    let item_ids: Vec<Uuid> = order.items().iter().map(|i| i.id).collect();
    let _guard = s.inflight.try_claim(&item_ids).map_err(AppError::UpdateInFlight)?;
    order.mark_paid();
    let mut tx = s.db.begin().await?;
    store::persist_order_state(&mut tx, &order).await?;
    tx.commit().await?;
    Ok(Json(detail_view(&s, id).await?))
}

pub async fn complete_refund(
    State(s): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OrderDetailView>> {
    let _guard = s.inflight.try_claim(&[item_id]).map_err(AppError::UpdateInFlight)?;
    let mut order = store::load_order(&s.db, id).await?;
    order.complete_refund(item_id)?;
    let mut tx = s.db.begin().await?;
    store::persist_order_state(&mut tx, &order).await?;
    tx.commit().await?;
    for event in order.take_events() {
        s.publish(&event).await;
    }
    Ok(Json(detail_view(&s, id).await?))
}
