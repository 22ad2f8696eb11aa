//! In-memory store implementation.
//!
//! Backs development without a database and the integration tests. Carts
//! are a map keyed by the owning user's id; there is no shared default
//! cart. Whole-map locks are fine at this scale.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use bookmarket_core::{BookId, Email, UserId, Username};

use crate::models::{Book, Cart, ProfileUpdate, User};

use super::{BookStore, CartStore, StoreError, UserStore};

struct UserRecord {
    user: User,
    password_hash: String,
}

/// Shared in-memory store implementing all three store traits.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
    books: RwLock<Vec<Book>>,
    carts: RwLock<HashMap<UserId, Cart>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        username: Username,
        email: Email,
        password_hash: String,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        let username_key = username.lookup_key();
        let email_key = email.lookup_key();
        for record in users.values() {
            if record.user.username.lookup_key() == username_key {
                return Err(StoreError::Conflict("username already exists".to_owned()));
            }
            if record.user.email.lookup_key() == email_key {
                return Err(StoreError::Conflict("email already exists".to_owned()));
            }
        }

        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            username,
            email,
            created_at: now,
            updated_at: now,
        };
        users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash,
            },
        );
        Ok(user)
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        let key = identifier.trim().to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().find_map(|record| {
            let matches = record.user.username.lookup_key() == key
                || record.user.email.lookup_key() == key;
            matches.then(|| (record.user.clone(), record.password_hash.clone()))
        }))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).map(|r| r.user.clone()))
    }

    async fn update_user(
        &self,
        id: UserId,
        update: ProfileUpdate,
        password_hash: Option<String>,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;

        if let Some(new_username) = &update.username {
            let key = new_username.lookup_key();
            let taken = users
                .iter()
                .any(|(other, r)| *other != id && r.user.username.lookup_key() == key);
            if taken {
                return Err(StoreError::Conflict("username already exists".to_owned()));
            }
        }

        let Some(record) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = update.username {
            record.user.username = username;
        }
        if let Some(hash) = password_hash {
            record.password_hash = hash;
        }
        record.user.updated_at = Utc::now();
        Ok(Some(record.user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let removed = self.users.write().await.remove(&id).is_some();
        // Orphaned carts are unreachable once the user is gone; drop them too.
        if removed {
            self.carts.write().await.remove(&id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.read().await.clone())
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.id == id).cloned())
    }

    async fn book_exists(&self, id: BookId) -> Result<bool, StoreError> {
        let books = self.books.read().await;
        Ok(books.iter().any(|b| b.id == id))
    }

    async fn insert_book(&self, book: Book) -> Result<Book, StoreError> {
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn update_book(&self, book: Book) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().await;
        match books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => {
                *slot = book.clone();
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    async fn delete_book(&self, id: BookId) -> Result<bool, StoreError> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| b.id != id);
        Ok(books.len() < before)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn load_cart(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        self.carts.write().await.insert(cart.user_id, cart.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn username(s: &str) -> Username {
        Username::parse(s).unwrap()
    }

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn duplicate_usernames_conflict_case_insensitively() {
        let store = MemoryStore::new();
        store
            .create_user(username("Alice"), email("alice@example.com"), "h1".into())
            .await
            .unwrap();

        let err = store
            .create_user(username("alice"), email("other@example.com"), "h2".into())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn find_by_identifier_matches_username_and_email() {
        let store = MemoryStore::new();
        let user = store
            .create_user(username("Alice"), email("Alice@Example.com"), "h".into())
            .await
            .unwrap();

        for identifier in ["alice", "ALICE", "alice@example.com"] {
            let (found, hash) = store
                .find_by_identifier(identifier)
                .await
                .unwrap()
                .unwrap_or_else(|| panic!("lookup failed for {identifier}"));
            assert_eq!(found.id, user.id);
            assert_eq!(hash, "h");
        }

        assert!(store.find_by_identifier("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_user_drops_their_cart() {
        let store = MemoryStore::new();
        let user = store
            .create_user(username("bob"), email("bob@example.com"), "h".into())
            .await
            .unwrap();

        store.save_cart(&Cart::empty(user.id)).await.unwrap();
        assert!(store.load_cart(user.id).await.unwrap().is_some());

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.load_cart(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn carts_are_scoped_per_user() {
        let store = MemoryStore::new();
        let a = UserId::generate();
        let b = UserId::generate();

        store.save_cart(&Cart::empty(a)).await.unwrap();

        assert!(store.load_cart(a).await.unwrap().is_some());
        assert!(store.load_cart(b).await.unwrap().is_none());
    }
}
