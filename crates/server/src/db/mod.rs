//! Persistence layer.
//!
//! The server talks to three stores behind traits so the binary can run
//! against `PostgreSQL` in production and the in-memory store in
//! development and tests. Cart access is a whole-cart read-modify-write
//! keyed by user id; concurrent writers to the same cart are resolved
//! last-writer-wins.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bookmarket_core::{BookId, Email, UserId, Username};

use crate::models::{Book, Cart, ProfileUpdate, User};

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique username/email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Store for user records and their password hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user.
    ///
    /// Fails with [`StoreError::Conflict`] when the username (matched
    /// case-insensitively) or email is already taken.
    async fn create_user(
        &self,
        username: Username,
        email: Email,
        password_hash: String,
    ) -> Result<User, StoreError>;

    /// Find a user and their password hash by login identifier: a username
    /// (case-insensitive) or an email address.
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>, StoreError>;

    /// Fetch a user by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Apply a profile update. `password_hash` replaces the stored hash
    /// when present. Returns the updated user, or `None` when absent.
    async fn update_user(
        &self,
        id: UserId,
        update: ProfileUpdate,
        password_hash: Option<String>,
    ) -> Result<Option<User>, StoreError>;

    /// Delete a user. Returns `true` when a record was removed.
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;
}

/// Store for the book catalog.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books, oldest first.
    async fn list_books(&self) -> Result<Vec<Book>, StoreError>;

    /// Fetch one book by id.
    async fn get_book(&self, id: BookId) -> Result<Option<Book>, StoreError>;

    /// Existence check used by the cart engine before adding a line item.
    async fn book_exists(&self, id: BookId) -> Result<bool, StoreError>;

    /// Persist a new book.
    async fn insert_book(&self, book: Book) -> Result<Book, StoreError>;

    /// Replace an existing book. Returns `None` when absent.
    async fn update_book(&self, book: Book) -> Result<Option<Book>, StoreError>;

    /// Delete a book. Returns `true` when a record was removed.
    async fn delete_book(&self, id: BookId) -> Result<bool, StoreError>;
}

/// Store for per-user carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load the cart for `user_id`, if one has been persisted.
    async fn load_cart(&self, user_id: UserId) -> Result<Option<Cart>, StoreError>;

    /// Persist the whole cart, replacing any previous state for the same
    /// user (last writer wins).
    async fn save_cart(&self, cart: &Cart) -> Result<(), StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
