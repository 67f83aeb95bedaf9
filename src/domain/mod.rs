//! Storefront domain: aggregates, value objects, the status registry and the
//! pricing rules. Everything here is persistence-agnostic.

pub mod aggregates;
pub mod coupon;
pub mod events;
pub mod pricing;
pub mod status;
pub mod value_objects;
