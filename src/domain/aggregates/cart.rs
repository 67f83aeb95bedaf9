//! Cart aggregate and the quantity control rules.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::pricing::PricedLine;
use crate::domain::value_objects::Money;

/// Hard per-line quantity cap, applied regardless of stock.
pub const MAX_LINE_QUANTITY: u32 = 7;

#[derive(Clone, Debug)]
pub struct CartEntry {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub offer_price: Option<Money>,
    pub stock: u32,
    pub out_of_stock: bool,
}

impl CartEntry {
    pub fn effective_price(&self) -> &Money {
        self.offer_price.as_ref().unwrap_or(&self.unit_price)
    }

    pub fn line_total(&self) -> Money {
        self.effective_price().multiply(self.quantity)
    }
}

#[derive(Clone, Debug)]
pub struct Cart {
    session_id: String,
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new(session_id: impl Into<String>, entries: Vec<CartEntry>) -> Self {
        Self { session_id: session_id.into(), entries }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subtotal(&self) -> Money {
        self.entries
            .iter()
            .fold(Money::zero("USD"), |acc, e| acc.add(&e.line_total()).unwrap_or(acc))
    }

    /// Merge on (product, variant) like the storefront's add-to-cart button;
    /// the merged quantity still honors the line cap.
    pub fn add_entry(&mut self, entry: CartEntry) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.product_id == entry.product_id && e.variant_id == entry.variant_id)
        {
            existing.quantity = existing.quantity.saturating_add(entry.quantity).min(MAX_LINE_QUANTITY);
        } else {
            self.entries.push(entry);
        }
    }

    /// Replace a line's quantity.
    ///
    /// Quantities below 1 are rejected outright. The requested value is capped
    /// at [`MAX_LINE_QUANTITY`] before the stock check; a capped quantity that
    /// still meets or exceeds the available stock fails and marks the entry
    /// out of stock. Success clears any prior out-of-stock flag and returns
    /// the effective quantity.
    pub fn set_quantity(
        &mut self,
        product_id: Uuid,
        variant_id: Option<Uuid>,
        requested: u32,
    ) -> Result<u32, CartError> {
        if requested < 1 {
            return Err(CartError::QuantityTooLow);
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.product_id == product_id && e.variant_id == variant_id)
            .ok_or(CartError::EntryNotFound)?;
        let capped = requested.min(MAX_LINE_QUANTITY);
        if capped >= entry.stock {
            entry.out_of_stock = true;
            return Err(CartError::OutOfStock);
        }
        entry.quantity = capped;
        entry.out_of_stock = false;
        Ok(capped)
    }

    pub fn remove_entry(&mut self, product_id: Uuid, variant_id: Option<Uuid>) -> Result<(), CartError> {
        let before = self.entries.len();
        self.entries.retain(|e| !(e.product_id == product_id && e.variant_id == variant_id));
        if self.entries.len() == before {
            return Err(CartError::EntryNotFound);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The shape the pricing aggregator consumes.
    pub fn priced_lines(&self) -> Vec<PricedLine> {
        self.entries
            .iter()
            .map(|e| PricedLine {
                unit_price: e.unit_price.amount(),
                offer_price: e.offer_price.as_ref().map(|m| m.amount()),
                quantity: e.quantity,
                stock: e.stock,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    QuantityTooLow,
    #[error("cart entry not found")]
    EntryNotFound,
    #[error("requested quantity is out of stock")]
    OutOfStock,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn entry(product_id: Uuid, qty: u32, stock: u32) -> CartEntry {
        CartEntry {
            product_id,
            variant_id: None,
            name: "Widget".into(),
            quantity: qty,
            unit_price: Money::usd(Decimal::new(10, 0)),
            offer_price: None,
            stock,
            out_of_stock: false,
        }
    }

    #[test]
    fn quantity_capped_at_seven() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new("s1", vec![entry(pid, 1, 20)]);
        let effective = cart.set_quantity(pid, None, 8).unwrap();
        assert_eq!(effective, 7);
        assert_eq!(cart.entries()[0].quantity, 7);
    }

    #[test]
    fn quantity_below_one_rejected() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new("s1", vec![entry(pid, 2, 20)]);
        assert!(matches!(cart.set_quantity(pid, None, 0), Err(CartError::QuantityTooLow)));
        assert_eq!(cart.entries()[0].quantity, 2);
    }

    #[test]
    fn stock_boundary_is_exclusive() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new("s1", vec![entry(pid, 1, 3)]);
        // Requesting exactly the stock fails and marks the entry.
        assert!(matches!(cart.set_quantity(pid, None, 3), Err(CartError::OutOfStock)));
        assert!(cart.entries()[0].out_of_stock);
        assert_eq!(cart.entries()[0].quantity, 1);
        // One below the stock succeeds and clears the flag.
        assert_eq!(cart.set_quantity(pid, None, 2).unwrap(), 2);
        assert!(!cart.entries()[0].out_of_stock);
    }

    #[test]
    fn add_merges_same_product_and_variant() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new("s1", vec![entry(pid, 2, 20)]);
        cart.add_entry(entry(pid, 1, 20));
        assert_eq!(cart.entries().len(), 1);
        assert_eq!(cart.entries()[0].quantity, 3);
        cart.add_entry(entry(pid, 10, 20));
        assert_eq!(cart.entries()[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn distinct_variants_are_separate_lines() {
        let pid = Uuid::new_v4();
        let red = Uuid::new_v4();
        let blue = Uuid::new_v4();
        let mut a = entry(pid, 3, 20);
        a.variant_id = Some(red);
        let mut b = entry(pid, 2, 20);
        b.variant_id = Some(blue);
        let mut cart = Cart::new("s1", vec![a]);
        cart.add_entry(b);
        // Same product in another variant must not merge into the first line.
        assert_eq!(cart.entries().len(), 2);
        assert_eq!(cart.entries()[0].quantity, 3);
        assert_eq!(cart.entries()[1].quantity, 2);
        // Quantity updates are keyed by variant as well.
        assert!(matches!(cart.set_quantity(pid, None, 2), Err(CartError::EntryNotFound)));
        assert_eq!(cart.set_quantity(pid, Some(blue), 4).unwrap(), 4);
        assert_eq!(cart.entries()[0].quantity, 3);
        assert_eq!(cart.entries()[1].quantity, 4);
    }

    #[test]
    fn offer_price_drives_subtotal() {
        let pid = Uuid::new_v4();
        let mut e = entry(pid, 2, 20);
        e.offer_price = Some(Money::usd(Decimal::new(8, 0)));
        let cart = Cart::new("s1", vec![e]);
        assert_eq!(cart.subtotal().amount(), Decimal::new(16, 0));
    }

    #[test]
    fn remove_missing_entry_errors() {
        let pid = Uuid::new_v4();
        let mut cart = Cart::new("s1", vec![entry(pid, 1, 5)]);
        assert!(cart.remove_entry(Uuid::new_v4(), None).is_err());
        cart.remove_entry(pid, None).unwrap();
        assert!(cart.is_empty());
    }
}
