//! HTTP surface: route table and shared list/validation helpers.

use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::state::AppState;

pub mod admin;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod collections;
pub mod coupons;
pub mod orders;
pub mod products;
pub mod reviews;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

pub(crate) fn page_bounds(page: Option<u32>, per_page: Option<u32>) -> (u32, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let offset = (i64::from(page) - 1) * i64::from(per_page);
    (page, i64::from(per_page), offset)
}

pub(crate) fn check<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "storefront"}))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // storefront
        .route("/api/v1/products", get(products::list).post(products::create))
        .route(
            "/api/v1/products/:id",
            get(products::get).put(products::update).delete(products::remove),
        )
        .route("/api/v1/products/:id/variants", post(products::create_variant))
        .route("/api/v1/products/:id/reviews", get(reviews::list_for_product).post(reviews::create))
        .route("/api/v1/categories", get(categories::list).post(categories::create))
        .route("/api/v1/categories/:id", get(categories::get).delete(categories::remove))
        .route("/api/v1/cart/:session", get(cart::get).post(cart::add).delete(cart::clear))
        .route(
            "/api/v1/cart/:session/items/:product_id",
            put(cart::set_quantity).delete(cart::remove),
        )
        .route("/api/v1/wishlist/:session", get(collections::wishlist_list).post(collections::wishlist_add))
        .route("/api/v1/wishlist/:session/:product_id", delete(collections::wishlist_remove))
        .route(
            "/api/v1/comparison/:session",
            get(collections::comparison_list).post(collections::comparison_add),
        )
        .route("/api/v1/comparison/:session/:product_id", delete(collections::comparison_remove))
        .route("/api/v1/coupons/:code", get(coupons::lookup))
        .route("/api/v1/checkout/:session", post(checkout::checkout))
        // orders
        .route("/api/v1/orders", get(orders::list))
        .route("/api/v1/orders/update-bulk", patch(orders::update_bulk))
        .route("/api/v1/orders/:id", get(orders::detail))
        .route("/api/v1/orders/:id/pay", post(orders::mark_paid))
        .route("/api/v1/orders/:id/items/:item_id/refund", post(orders::complete_refund))
        // admin back-office
        .route("/api/v1/admin/users", get(admin::list_users))
        .route("/api/v1/admin/users/:id/ban", post(admin::ban_user).delete(admin::unban_user))
        .route("/api/v1/admin/categories", get(admin::list_categories))
        .route("/api/v1/admin/coupons", get(admin::list_coupons).post(admin::create_coupon))
        .route("/api/v1/admin/coupons/:id", put(admin::update_coupon).delete(admin::delete_coupon))
        .route("/api/v1/admin/products", get(admin::list_products))
        .route("/api/v1/admin/orders", get(admin::list_orders))
        .route("/api/v1/admin/reviews", get(admin::list_reviews))
        .route("/api/v1/admin/reviews/:id", delete(admin::delete_review))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::page_bounds;

    #[test]
    fn page_bounds_clamps_and_defaults() {
        assert_eq!(page_bounds(None, None), (1, 20, 0));
        assert_eq!(page_bounds(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(page_bounds(Some(3), Some(25)), (3, 25, 50));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let (page, limit, offset) = page_bounds(Some(u32::MAX), Some(100));
        assert_eq!(page, u32::MAX);
        assert_eq!(limit, 100);
        assert_eq!(offset, (i64::from(u32::MAX) - 1) * 100);
    }
}
