//! `PostgreSQL` store implementation.
//!
//! Schema lives in `migrations/`. Queries use the runtime sqlx API; rows
//! are decoded into row structs and converted into domain types, with
//! invalid stored data surfaced as [`StoreError::DataCorruption`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use bookmarket_core::{BookId, Email, UserId, Username};

use crate::models::{Book, Cart, CartItem, ProfileUpdate, User};

use super::{BookStore, CartStore, StoreError, UserStore};

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for health checks.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<(User, String), StoreError> {
        let username = Username::parse(&self.username).map_err(|e| {
            StoreError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let email = Email::parse(&self.email)
            .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;
        Ok((
            User {
                id: self.id,
                username,
                email,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            self.password_hash,
        ))
    }
}

#[derive(FromRow)]
struct BookRow {
    id: BookId,
    title: String,
    author: String,
    genre: String,
    description: String,
    price: Decimal,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(r: BookRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            author: r.author,
            genre: r.genre,
            description: r.description,
            price: r.price,
            image: r.image,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CartItemRow {
    book_id: BookId,
    title: String,
    author: String,
    price: Decimal,
    quantity: i32,
    image: String,
}

impl CartItemRow {
    fn into_item(self) -> Result<CartItem, StoreError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            StoreError::DataCorruption(format!(
                "negative quantity {} for book {}",
                self.quantity, self.book_id
            ))
        })?;
        Ok(CartItem {
            book_id: self.book_id,
            title: self.title,
            author: self.author,
            price: self.price,
            quantity,
            image: self.image,
        })
    }
}

/// Map unique-constraint violations to [`StoreError::Conflict`].
fn map_insert_error(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(format!("{what} already exists"));
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        username: Username,
        email: Email,
        password_hash: String,
    ) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, created_at, updated_at
            ",
        )
        .bind(UserId::generate())
        .bind(username.as_str())
        .bind(email.as_str())
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "username or email"))?;

        row.into_user().map(|(user, _)| user)
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)
            ",
        )
        .bind(identifier.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user().map(|(user, _)| user)).transpose()
    }

    async fn update_user(
        &self,
        id: UserId,
        update: ProfileUpdate,
        password_hash: Option<String>,
    ) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            UPDATE users
            SET username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.username.as_ref().map(Username::as_str))
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "username"))?;

        row.map(|r| r.into_user().map(|(user, _)| user)).transpose()
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BookStore for PgStore {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        let rows: Vec<BookRow> = sqlx::query_as(
            r"
            SELECT id, title, author, genre, description, price, image, created_at, updated_at
            FROM books
            ORDER BY created_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let row: Option<BookRow> = sqlx::query_as(
            r"
            SELECT id, title, author, genre, description, price, image, created_at, updated_at
            FROM books
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn book_exists(&self, id: BookId) -> Result<bool, StoreError> {
        let exists: Option<(bool,)> =
            sqlx::query_as("SELECT TRUE FROM books WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(exists.is_some())
    }

    async fn insert_book(&self, book: Book) -> Result<Book, StoreError> {
        sqlx::query(
            r"
            INSERT INTO books (id, title, author, genre, description, price, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.description)
        .bind(book.price)
        .bind(&book.image)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(book)
    }

    async fn update_book(&self, book: Book) -> Result<Option<Book>, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE books
            SET title = $2, author = $3, genre = $4, description = $5,
                price = $6, image = $7, updated_at = $8
            WHERE id = $1
            ",
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.description)
        .bind(book.price)
        .bind(&book.image)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() > 0).then_some(book))
    }

    async fn delete_book(&self, id: BookId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn load_cart(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        let cart_row: Option<(UserId,)> =
            sqlx::query_as("SELECT user_id FROM carts WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        if cart_row.is_none() {
            return Ok(None);
        }

        let rows: Vec<CartItemRow> = sqlx::query_as(
            r"
            SELECT book_id, title, author, price, quantity, image
            FROM cart_items
            WHERE user_id = $1
            ORDER BY position ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(CartItemRow::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        let mut cart = Cart {
            user_id,
            items,
            total: Decimal::ZERO,
        };
        // The total is derived state; never trust what was stored.
        cart.recompute_total();
        Ok(Some(cart))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO carts (user_id, updated_at)
            VALUES ($1, NOW())
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            ",
        )
        .bind(cart.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(cart.user_id)
            .execute(&mut *tx)
            .await?;

        for (position, item) in cart.items.iter().enumerate() {
            let position = i32::try_from(position).map_err(|_| {
                StoreError::DataCorruption("cart has more items than fit in i32".to_owned())
            })?;
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                StoreError::DataCorruption(format!(
                    "quantity {} for book {} exceeds storage range",
                    item.quantity, item.book_id
                ))
            })?;
            sqlx::query(
                r"
                INSERT INTO cart_items (user_id, book_id, title, author, price, quantity, image, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(cart.user_id)
            .bind(item.book_id)
            .bind(&item.title)
            .bind(&item.author)
            .bind(item.price)
            .bind(quantity)
            .bind(&item.image)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
