//! Product aggregate.
//!
//! A product carries a base price, an optional offer price and base stock;
//! variants override price/offer/stock per colour/size. Effective values for
//! display and cart math resolve the variant over the base.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::{Money, Quantity, Sku};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProductStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Variant {
    pub id: Uuid,
    pub color: Option<String>,
    pub size: Option<String>,
    pub price: Option<Money>,
    pub offer_price: Option<Money>,
    pub stock: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct Product {
    id: Uuid,
    sku: Sku,
    name: String,
    description: Option<String>,
    price: Money,
    offer_price: Option<Money>,
    inventory: Quantity,
    status: ProductStatus,
    variants: Vec<Variant>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(sku: Sku, name: impl Into<String>, price: Money) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sku,
            name: name.into(),
            description: None,
            price,
            offer_price: None,
            inventory: Quantity::default(),
            status: ProductStatus::Draft,
            variants: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        sku: Sku,
        name: String,
        description: Option<String>,
        price: Money,
        offer_price: Option<Money>,
        inventory: Quantity,
        status: ProductStatus,
        variants: Vec<Variant>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, sku, name, description, price, offer_price, inventory, status, variants, created_at, updated_at }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn sku(&self) -> &Sku {
        &self.sku
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    pub fn price(&self) -> &Money {
        &self.price
    }
    pub fn offer_price(&self) -> Option<&Money> {
        self.offer_price.as_ref()
    }
    pub fn status(&self) -> &ProductStatus {
        &self.status
    }
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }
    pub fn inventory(&self) -> Quantity {
        self.inventory
    }

    pub fn variant(&self, variant_id: Uuid) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Variant overrides win over base values; within either level, the offer
    /// price wins over the list price.
    pub fn effective_price(&self, variant: Option<&Variant>) -> Money {
        let price = variant
            .and_then(|v| v.price.clone())
            .unwrap_or_else(|| self.price.clone());
        let offer = variant
            .and_then(|v| v.offer_price.clone())
            .or_else(|| self.offer_price.clone());
        offer.unwrap_or(price)
    }

    /// The list price the effective price is compared against for display.
    pub fn effective_list_price(&self, variant: Option<&Variant>) -> Money {
        variant.and_then(|v| v.price.clone()).unwrap_or_else(|| self.price.clone())
    }

    pub fn effective_stock(&self, variant: Option<&Variant>) -> u32 {
        variant.and_then(|v| v.stock).unwrap_or_else(|| self.inventory.value())
    }

    pub fn is_in_stock(&self, variant: Option<&Variant>) -> bool {
        self.effective_stock(variant) > 0
    }

    pub fn publish(&mut self) -> Result<(), ProductError> {
        if self.name.is_empty() {
            return Err(ProductError::MissingName);
        }
        self.status = ProductStatus::Active;
        self.touch();
        Ok(())
    }

    pub fn archive(&mut self) {
        self.status = ProductStatus::Archived;
        self.touch();
    }

    pub fn add_inventory(&mut self, qty: u32) {
        self.inventory = self.inventory.add(qty);
        self.touch();
    }

    pub fn remove_inventory(&mut self, qty: u32) -> Result<(), ProductError> {
        self.inventory = self.inventory.subtract(qty).ok_or(ProductError::InsufficientInventory)?;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProductError {
    #[error("product name is missing")]
    MissingName,
    #[error("insufficient inventory")]
    InsufficientInventory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product() -> Product {
        let mut p = Product::create(
            Sku::new("TEE-001").unwrap(),
            "Tee",
            Money::usd(Decimal::new(20, 0)),
        );
        p.add_inventory(10);
        p
    }

    #[test]
    fn base_offer_price_wins_without_variant() {
        let mut p = product();
        assert_eq!(p.effective_price(None).amount(), Decimal::new(20, 0));
        p = Product::from_parts(
            p.id(),
            p.sku().clone(),
            p.name().to_string(),
            None,
            Money::usd(Decimal::new(20, 0)),
            Some(Money::usd(Decimal::new(15, 0))),
            p.inventory(),
            ProductStatus::Active,
            vec![],
            p.created_at,
            p.updated_at,
        );
        assert_eq!(p.effective_price(None).amount(), Decimal::new(15, 0));
    }

    #[test]
    fn variant_overrides_price_and_stock() {
        let p = product();
        let variant = Variant {
            id: Uuid::new_v4(),
            color: Some("red".into()),
            size: Some("M".into()),
            price: Some(Money::usd(Decimal::new(25, 0))),
            offer_price: None,
            stock: Some(3),
        };
        assert_eq!(p.effective_price(Some(&variant)).amount(), Decimal::new(25, 0));
        assert_eq!(p.effective_stock(Some(&variant)), 3);
        // Variant without overrides falls back to the base values.
        let bare = Variant { id: Uuid::new_v4(), color: None, size: None, price: None, offer_price: None, stock: None };
        assert_eq!(p.effective_price(Some(&bare)).amount(), Decimal::new(20, 0));
        assert_eq!(p.effective_stock(Some(&bare)), 10);
    }

    #[test]
    fn variant_offer_beats_variant_price() {
        let p = product();
        let variant = Variant {
            id: Uuid::new_v4(),
            color: None,
            size: None,
            price: Some(Money::usd(Decimal::new(25, 0))),
            offer_price: Some(Money::usd(Decimal::new(18, 0))),
            stock: None,
        };
        assert_eq!(p.effective_price(Some(&variant)).amount(), Decimal::new(18, 0));
    }

    #[test]
    fn inventory_lifecycle() {
        let mut p = product();
        assert!(p.is_in_stock(None));
        p.remove_inventory(10).unwrap();
        assert!(!p.is_in_stock(None));
        assert!(p.remove_inventory(1).is_err());
    }

    #[test]
    fn publish_requires_name() {
        let mut p = product();
        p.publish().unwrap();
        assert_eq!(p.status(), &ProductStatus::Active);
    }
}
