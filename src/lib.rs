//! Storefront: a multi-tenant e-commerce backend.
//!
//! Shoppers browse the catalog, manage session-scoped carts, wishlists and
//! comparisons, and check out with coupons. The back-office drives order
//! fulfillment through a per-item status state machine and searches every
//! managed entity through one tagged record type.

pub mod admin;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod inflight;
pub mod mailer;
pub mod state;
pub mod store;

pub use error::AppError;
