//! The visitor's shopping cart.
//!
//! Lines are keyed by product id. Totals use exact decimal arithmetic: VAT is
//! applied once to the subtotal, and nothing is rounded until display.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Price, ProductId};

/// Errors from cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    /// VAT-exclusive price captured when the line was added.
    pub unit_price: Price,
    pub quantity: u32,
    pub image: Option<String>,
}

impl CartItem {
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Price,
        quantity: u32,
        image: Option<String>,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity,
            image,
        }
    }

    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity
    }
}

/// Cart totals, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    pub units: u32,
    pub subtotal: Price,
    pub vat: Price,
    pub total: Price,
}

/// A shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Lines in the order they were first added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn units(&self) -> u32 {
        self.items
            .iter()
            .map(|item| item.quantity)
            .fold(0, u32::saturating_add)
    }

    /// Add a line, merging with an existing line for the same product.
    ///
    /// With a known `stock`, the resulting quantity is clamped to it. Returns
    /// the line's quantity after the add.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] for a zero quantity and
    /// [`CartError::OutOfStock`] when `stock` is zero.
    pub fn add(&mut self, item: CartItem, stock: Option<u32>) -> Result<u32, CartError> {
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if stock == Some(0) {
            return Err(CartError::OutOfStock(item.product_id));
        }
        let clamp = |quantity: u32| stock.map_or(quantity, |limit| quantity.min(limit));

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            line.quantity = clamp(line.quantity.saturating_add(item.quantity));
            // Prices follow the latest catalog read.
            line.unit_price = item.unit_price;
            return Ok(line.quantity);
        }

        let quantity = clamp(item.quantity);
        self.items.push(CartItem { quantity, ..item });
        Ok(quantity)
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        stock: Option<u32>,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self
                .remove(product_id)
                .map(|_| ())
                .ok_or(CartError::NotInCart(product_id));
        }
        let line = self
            .items
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        line.quantity = stock.map_or(quantity, |limit| quantity.min(limit.max(1)));
        Ok(())
    }

    /// Remove a line, returning it if present.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartItem> {
        let index = self
            .items
            .iter()
            .position(|line| line.product_id == product_id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Units, subtotal, VAT and total.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let subtotal: Price = self.items.iter().map(CartItem::line_total).sum();
        CartTotals {
            units: self.units(),
            subtotal,
            vat: subtotal.vat(),
            total: subtotal.with_vat(),
        }
    }
}
