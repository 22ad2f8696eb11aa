//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::{BookStore, CartStore, UserStore, memory::MemoryStore};
use crate::services::{AuthService, CartEngine, TokenService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the stores, services and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    books: Arc<dyn BookStore>,
    tokens: TokenService,
    auth: AuthService,
    cart: CartEngine,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create a new application state over the given stores.
    ///
    /// `pool` is kept only for the readiness probe; the stores own their
    /// own connections.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        books: Arc<dyn BookStore>,
        carts: Arc<dyn CartStore>,
        pool: Option<PgPool>,
    ) -> Self {
        let tokens = TokenService::new(&config.token_secret);
        let auth = AuthService::new(users);
        let cart = CartEngine::new(books.clone(), carts);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                books,
                tokens,
                auth,
                cart,
                pool,
            }),
        }
    }

    /// Create an application state backed entirely by in-memory stores.
    #[must_use]
    pub fn in_memory(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store.clone(), store, None)
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the book store.
    #[must_use]
    pub fn books(&self) -> &Arc<dyn BookStore> {
        &self.inner.books
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the cart engine.
    #[must_use]
    pub fn cart(&self) -> &CartEngine {
        &self.inner.cart
    }

    /// Get a reference to the database connection pool, if configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
