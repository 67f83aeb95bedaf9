//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;

pub use cart::{Cart, CartEntry, CartError, MAX_LINE_QUANTITY};
pub use order::{Address, Order, OrderError, OrderItem, PaymentStatus, RefundStatus};
pub use product::{Product, ProductError, ProductStatus, Variant};
