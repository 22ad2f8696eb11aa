//! Cart engine.
//!
//! Mediates between the HTTP layer and the cart/book stores: parses and
//! checks book IDs against the catalog, applies the line-item arithmetic
//! from [`crate::models::Cart`], and persists the result.

use std::sync::Arc;

use thiserror::Error;

use bookmarket_core::{BookId, UserId};

use crate::db::{BookStore, CartStore, StoreError};
use crate::models::{Cart, ItemSnapshot};

/// Largest quantity a line item can hold (`i32::MAX`, the ceiling of the
/// storage column).
pub const MAX_QUANTITY: u32 = 2_147_483_647;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Malformed request data (bad ID, quantity below one).
    #[error("{0}")]
    InvalidInput(String),

    /// The referenced book does not exist in the catalog.
    #[error("book not found")]
    BookNotFound,

    /// The user has no cart yet.
    #[error("cart not found")]
    CartNotFound,

    /// The book is not a line item in the user's cart.
    #[error("item not found in cart")]
    ItemNotFound,

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Cart operations over the book and cart stores.
#[derive(Clone)]
pub struct CartEngine {
    books: Arc<dyn BookStore>,
    carts: Arc<dyn CartStore>,
}

impl CartEngine {
    /// Create a new cart engine.
    #[must_use]
    pub fn new(books: Arc<dyn BookStore>, carts: Arc<dyn CartStore>) -> Self {
        Self { books, carts }
    }

    /// Fetch the user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` on persistence failures.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, CartError> {
        if let Some(cart) = self.carts.load_cart(user_id).await? {
            return Ok(cart);
        }

        let cart = Cart::empty(user_id);
        self.carts.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Add one unit of a book to the user's cart.
    ///
    /// The book must exist in the catalog. If the cart already has a line
    /// for it the quantity is incremented and the stored snapshot is kept;
    /// otherwise a new line is appended with the supplied snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` when `raw_book_id` is not a valid
    /// ID, `CartError::BookNotFound` when the catalog has no such book.
    pub async fn add_item(
        &self,
        user_id: UserId,
        raw_book_id: &str,
        snapshot: ItemSnapshot,
    ) -> Result<Cart, CartError> {
        let book_id = parse_book_id(raw_book_id)?;
        if !self.books.book_exists(book_id).await? {
            return Err(CartError::BookNotFound);
        }

        let mut cart = match self.carts.load_cart(user_id).await? {
            Some(cart) => cart,
            None => Cart::empty(user_id),
        };
        cart.add_one(book_id, snapshot);
        self.carts.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Set the quantity of an existing line item to an absolute value.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` for a bad ID or a quantity
    /// outside `1..=MAX_QUANTITY`, `CartError::CartNotFound` when the user
    /// has no cart, and `CartError::ItemNotFound` when the book is not in
    /// the cart.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        raw_book_id: &str,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let book_id = parse_book_id(raw_book_id)?;
        if quantity < 1 {
            return Err(CartError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q <= MAX_QUANTITY)
            .ok_or_else(|| {
                CartError::InvalidInput(format!("Quantity must not exceed {MAX_QUANTITY}"))
            })?;

        let mut cart = self
            .carts
            .load_cart(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        if !cart.set_quantity(book_id, quantity) {
            return Err(CartError::ItemNotFound);
        }
        self.carts.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Remove one unit of a book from the cart.
    ///
    /// Decrements the line's quantity; a line at quantity one is removed
    /// entirely.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidInput` for a bad ID,
    /// `CartError::CartNotFound` when the user has no cart, and
    /// `CartError::ItemNotFound` when the book is not in the cart.
    pub async fn remove_one_unit(
        &self,
        user_id: UserId,
        raw_book_id: &str,
    ) -> Result<Cart, CartError> {
        let book_id = parse_book_id(raw_book_id)?;

        let mut cart = self
            .carts
            .load_cart(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        if !cart.remove_one(book_id) {
            return Err(CartError::ItemNotFound);
        }
        self.carts.save_cart(&cart).await?;
        Ok(cart)
    }
}

fn parse_book_id(raw: &str) -> Result<BookId, CartError> {
    BookId::parse(raw).map_err(|_| CartError::InvalidInput("Invalid book ID".to_string()))
}
