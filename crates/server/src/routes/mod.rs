//! HTTP route handlers for the bookstore API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (pings the database)
//!
//! # Auth
//! POST   /auth/register        - Register a new user
//! POST   /auth/login           - Log in, returns a token + session cookie
//! POST   /auth/logout          - Clear the session cookie
//! GET    /auth/users/{id}      - User profile (requires auth)
//! PUT    /auth/users/{id}      - Update own profile (requires auth)
//! DELETE /auth/users/{id}      - Delete own account (requires auth)
//!
//! # Books
//! GET    /books                - Catalog listing (public)
//! GET    /books/{id}           - Book detail (public)
//! POST   /books                - Add a book (requires auth)
//! PUT    /books/{id}           - Update a book (requires auth)
//! DELETE /books/{id}           - Delete a book (requires auth)
//!
//! # Cart (all require auth)
//! GET    /cart                 - Fetch the cart, creating it on first use
//! POST   /cart/add             - Add one unit of a book
//! PUT    /cart/update/{bookId} - Set a line item's quantity
//! DELETE /cart/remove/{bookId} - Remove one unit of a book
//! ```

pub mod auth;
pub mod books;
pub mod cart;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route(
            "/users/{id}",
            get(auth::get_user)
                .put(auth::update_user)
                .delete(auth::delete_user),
        )
}

/// Create the book routes router.
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(books::index).post(books::create))
        .route(
            "/{id}",
            get(books::show).put(books::update).delete(books::remove),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update/{bookId}", put(cart::update))
        .route("/remove/{bookId}", delete(cart::remove))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/books", book_routes())
        .nest("/cart", cart_routes())
}
