//! Cart domain types and mutation rules.
//!
//! The cart owns its consistency rules: one line item per book, quantity
//! never below 1, and a total that is always recomputed from the line
//! items, never accepted from a client.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bookmarket_core::{BookId, UserId};

/// Display fields copied into a line item when it is first added.
///
/// Snapshot semantics: later catalog edits do not propagate into carts.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSnapshot {
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub image: String,
}

/// One book entry within a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    /// Price snapshotted at first add.
    pub price: Decimal,
    pub quantity: u32,
    pub image: String,
}

impl CartItem {
    fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A user's shopping cart. Identity is the owning user's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: UserId,
    /// Line items in insertion order.
    pub items: Vec<CartItem>,
    /// Derived: always the sum of price x quantity over `items`.
    pub total: Decimal,
}

impl Cart {
    /// An empty cart for `user_id` (no items, total zero).
    #[must_use]
    pub const fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            total: Decimal::ZERO,
        }
    }

    /// Recompute the derived total from the line items.
    pub fn recompute_total(&mut self) {
        self.total = self.items.iter().map(CartItem::line_total).sum();
    }

    /// Add one unit of `book_id`.
    ///
    /// An existing line item has its quantity incremented; otherwise a new
    /// line item with quantity 1 is appended from `snapshot`. The total is
    /// recomputed.
    pub fn add_one(&mut self, book_id: BookId, snapshot: ItemSnapshot) {
        if let Some(item) = self.items.iter_mut().find(|i| i.book_id == book_id) {
            item.quantity += 1;
        } else {
            self.items.push(CartItem {
                book_id,
                title: snapshot.title,
                author: snapshot.author,
                price: snapshot.price,
                quantity: 1,
                image: snapshot.image,
            });
        }
        self.recompute_total();
    }

    /// Set the quantity of an existing line item to exactly `quantity`.
    ///
    /// Callers must reject `quantity < 1` before calling; this is an
    /// absolute set, not an increment. Returns `false` when no line item
    /// for `book_id` exists (cart unchanged).
    pub fn set_quantity(&mut self, book_id: BookId, quantity: u32) -> bool {
        debug_assert!(quantity >= 1);
        let Some(item) = self.items.iter_mut().find(|i| i.book_id == book_id) else {
            return false;
        };
        item.quantity = quantity;
        self.recompute_total();
        true
    }

    /// Remove one unit of `book_id`: decrement above 1, delete the line
    /// item at 1. Returns `false` when no line item exists (cart unchanged).
    pub fn remove_one(&mut self, book_id: BookId) -> bool {
        let Some(pos) = self.items.iter().position(|i| i.book_id == book_id) else {
            return false;
        };
        let Some(item) = self.items.get_mut(pos) else {
            return false;
        };
        if item.quantity > 1 {
            item.quantity -= 1;
        } else {
            self.items.remove(pos);
        }
        self.recompute_total();
        true
    }
}
