//! Application error taxonomy.
//!
//! Validation problems reject before any store access; conflicts (illegal
//! edges, overlapping in-flight updates) map to 409; everything internal is
//! logged in full and surfaced as an opaque 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::cart::CartError;
use crate::domain::aggregates::order::OrderError;
use crate::domain::status::{OrderItemStatus, ParseStatusError};
use crate::domain::value_objects::ReasonError;
use crate::mailer::MailError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("requested quantity is out of stock")]
    OutOfStock,
    #[error("status change from {from} to {to} is not permitted")]
    IllegalTransition { from: OrderItemStatus, to: OrderItemStatus },
    #[error("a status update for item {0} is already in flight")]
    UpdateInFlight(Uuid),
    #[error("coupon is {0}")]
    CouponUnusable(&'static str),
    #[error("account is banned")]
    Banned,
    #[error("mail dispatch failed")]
    Mail,
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OutOfStock | Self::CouponUnusable(_) => StatusCode::BAD_REQUEST,
            Self::IllegalTransition { .. } | Self::UpdateInFlight(_) => StatusCode::CONFLICT,
            Self::Banned => StatusCode::FORBIDDEN,
            Self::Mail | Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NoItems => Self::Validation(e.to_string()),
            OrderError::ItemNotFound(_) => Self::NotFound("order item"),
            OrderError::ReasonRequired(_) => Self::Validation(e.to_string()),
            OrderError::IllegalTransition { from, to } => Self::IllegalTransition { from, to },
            OrderError::NoOpenRefund(_) => Self::Validation(e.to_string()),
        }
    }
}

impl From<CartError> for AppError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::QuantityTooLow => Self::Validation(e.to_string()),
            CartError::EntryNotFound => Self::NotFound("cart entry"),
            CartError::OutOfStock => Self::OutOfStock,
        }
    }
}

impl From<ReasonError> for AppError {
    fn from(e: ReasonError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<ParseStatusError> for AppError {
    fn from(e: ParseStatusError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<MailError> for AppError {
    fn from(_: MailError) -> Self {
        Self::Mail
    }
}
