//! End-to-end API tests over the in-memory store.
//!
//! Each test builds the real router and drives it with `tower::oneshot`,
//! exercising the same stack the binary serves.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use bookmarket_server::app::build_app;
use bookmarket_server::config::ServerConfig;
use bookmarket_server::state::AppState;

fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: None,
        host: "127.0.0.1".parse().unwrap(),
        port: 5001,
        base_url: "http://localhost:5001".to_string(),
        token_secret: SecretString::from("kX9#mP2$vQ7!wR4@zT8%nL5^bJ3&hF6*"),
        frontend_origin: "http://localhost:3000".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

fn app() -> Router {
    build_app(AppState::in_memory(test_config()))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn register(app: &Router, username: &str, email: &str) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": "hunter2-hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "User registered successfully");
}

/// Register and log in, returning the token.
async fn login(app: &Router, username: &str, email: &str) -> String {
    register(app, username, email).await;
    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "identifier": username, "password": "hunter2-hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Login successful");
    body["token"].as_str().unwrap().to_string()
}

/// Create a catalog entry, returning its id.
async fn create_book(app: &Router, token: &str, title: &str, price: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/books",
        Some(token),
        Some(json!({
            "title": title,
            "author": "Frank Herbert",
            "genre": "Sci-Fi",
            "description": "Spice and sandworms.",
            "price": price,
            "image": "/covers/dune.jpg",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Book added successfully");
    body["book"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = app();

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No database configured means nothing to wait on.
    let response = app
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_validates_all_fields_at_once() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "short" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("username"), "{message}");
    assert!(message.contains("email"), "{message}");
    assert!(message.contains("password"), "{message}");
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "ALICE",
            "email": "other@example.com",
            "password": "hunter2-hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn login_sets_session_cookie_and_rejects_bad_credentials() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;

    let request = Request::post("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({
                "identifier": "alice@example.com",
                "password": "hunter2-hunter2",
            }))
            .unwrap(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("token="), "{cookie}");
    assert!(cookie.contains("HttpOnly"), "{cookie}");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "identifier": "alice", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn session_cookie_authenticates_requests() {
    let app = app();
    let token = login(&app, "alice", "alice@example.com").await;

    let request = Request::get("/cart")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = app();
    let response = app
        .oneshot(Request::post("/auth/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = app();

    let (status, body) = send(&app, "GET", "/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access denied. No token provided.");

    let (status, _) = send(
        &app,
        "POST",
        "/books",
        None,
        Some(json!({ "title": "Dune" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/cart", Some("garbage-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn catalog_reads_are_public() {
    let app = app();
    let token = login(&app, "alice", "alice@example.com").await;
    let book_id = create_book(&app, &token, "Dune", "12.99").await;

    let (status, body) = send(&app, "GET", "/books", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    // Genre is normalized to lowercase on write.
    assert_eq!(body[0]["genre"], "sci-fi");

    let (status, body) = send(&app, "GET", &format!("/books/{book_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Dune");

    let (status, _) = send(
        &app,
        "GET",
        "/books/00000000-0000-0000-0000-000000000000",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/books/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn book_update_and_delete() {
    let app = app();
    let token = login(&app, "alice", "alice@example.com").await;
    let book_id = create_book(&app, &token, "Dune", "12.99").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/books/{book_id}"),
        Some(&token),
        Some(json!({
            "title": "Dune Messiah",
            "author": "Frank Herbert",
            "genre": "Sci-Fi",
            "description": "The sequel.",
            "price": "14.99",
            "image": "/covers/messiah.jpg",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Book updated successfully");
    assert_eq!(body["book"]["title"], "Dune Messiah");
    assert_eq!(body["book"]["price"], "14.99");

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/books/{book_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted successfully");

    let (status, _) = send(&app, "GET", &format!("/books/{book_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cart_flow_add_update_remove() {
    let app = app();
    let token = login(&app, "alice", "alice@example.com").await;
    let book_id = create_book(&app, &token, "Dune", "20").await;

    // First access creates an empty cart.
    let (status, body) = send(&app, "GET", "/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], "0");

    let add_body = json!({
        "bookId": book_id,
        "title": "Dune",
        "author": "Frank Herbert",
        "price": "20",
        "image": "/covers/dune.jpg",
    });

    let (status, body) = send(&app, "POST", "/cart/add", Some(&token), Some(add_body.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total"], "20");

    // Adding the same book again increments the line, never duplicates it.
    let (status, body) = send(&app, "POST", "/cart/add", Some(&token), Some(add_body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["total"], "40");

    // Quantity updates are absolute.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/cart/update/{book_id}"),
        Some(&token),
        Some(json!({ "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["quantity"], 5);
    assert_eq!(body["total"], "100");

    // Removal peels off one unit at a time.
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/cart/remove/{book_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["quantity"], 4);
    assert_eq!(body["total"], "80");
}

#[tokio::test]
async fn removing_the_last_unit_drops_the_line() {
    let app = app();
    let token = login(&app, "alice", "alice@example.com").await;
    let book_id = create_book(&app, &token, "Dune", "20").await;

    send(
        &app,
        "POST",
        "/cart/add",
        Some(&token),
        Some(json!({
            "bookId": book_id,
            "title": "Dune",
            "author": "Frank Herbert",
            "price": "20",
            "image": "/covers/dune.jpg",
        })),
    )
    .await;

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/cart/remove/{book_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], "0");
}

#[tokio::test]
async fn cart_rejects_unknown_books_and_bad_quantities() {
    let app = app();
    let token = login(&app, "alice", "alice@example.com").await;
    let book_id = create_book(&app, &token, "Dune", "20").await;

    let (status, body) = send(
        &app,
        "POST",
        "/cart/add",
        Some(&token),
        Some(json!({
            "bookId": "00000000-0000-0000-0000-000000000000",
            "title": "Ghost",
            "author": "Nobody",
            "price": "5",
            "image": "x.jpg",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid book ID");

    // No cart yet: quantity update has nothing to act on.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/cart/update/{book_id}"),
        Some(&token),
        Some(json!({ "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Cart not found");

    send(&app, "GET", "/cart", Some(&token), None).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/cart/update/{book_id}"),
        Some(&token),
        Some(json!({ "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Quantity must be at least 1");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/cart/update/{book_id}"),
        Some(&token),
        Some(json!({ "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "Item not found in cart");
}

#[tokio::test]
async fn prices_are_bounded_to_the_storage_range() {
    let app = app();
    let token = login(&app, "alice", "alice@example.com").await;

    // Catalog rejects a price beyond NUMERIC(12, 2).
    let (status, body) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "Sci-Fi",
            "description": "Spice and sandworms.",
            "price": "79228162514264337593543950335",
            "image": "/covers/dune.jpg",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("price"), "{body}");

    // The add-to-cart snapshot gets the same bound.
    let book_id = create_book(&app, &token, "Dune", "20").await;
    let (status, body) = send(
        &app,
        "POST",
        "/cart/add",
        Some(&token),
        Some(json!({
            "bookId": book_id,
            "title": "Dune",
            "author": "Frank Herbert",
            "price": "79228162514264337593543950335",
            "image": "/covers/dune.jpg",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("price"), "{body}");
}

#[tokio::test]
async fn repeated_adds_at_the_price_ceiling_keep_totals_exact() {
    let app = app();
    let token = login(&app, "alice", "alice@example.com").await;
    let book_id = create_book(&app, &token, "Dune", "9999999999.99").await;

    let add_body = json!({
        "bookId": book_id,
        "title": "Dune",
        "author": "Frank Herbert",
        "price": "9999999999.99",
        "image": "/covers/dune.jpg",
    });

    let (status, _) = send(&app, "POST", "/cart/add", Some(&token), Some(add_body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "POST", "/cart/add", Some(&token), Some(add_body)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total"], "19999999999.98");
}

#[tokio::test]
async fn carts_are_isolated_per_user() {
    let app = app();
    let alice = login(&app, "alice", "alice@example.com").await;
    let bob = login(&app, "bob", "bob@example.com").await;
    let book_id = create_book(&app, &alice, "Dune", "20").await;

    send(
        &app,
        "POST",
        "/cart/add",
        Some(&alice),
        Some(json!({
            "bookId": book_id,
            "title": "Dune",
            "author": "Frank Herbert",
            "price": "20",
            "image": "/covers/dune.jpg",
        })),
    )
    .await;

    let (status, body) = send(&app, "GET", "/cart", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn profile_can_only_be_modified_by_its_owner() {
    let app = app();
    let alice = login(&app, "alice", "alice@example.com").await;
    let bob = login(&app, "bob", "bob@example.com").await;

    // Alice updates herself: allowed.
    let (_, updated) = send(
        &app,
        "PUT",
        &format!("/auth/users/{}", user_id(&app, &alice).await),
        Some(&alice),
        Some(json!({ "username": "alice2" })),
    )
    .await;
    assert_eq!(updated["message"], "User updated successfully");
    assert_eq!(updated["user"]["username"], "alice2");

    // Alice updates bob: forbidden.
    let bob_id = user_id(&app, &bob).await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/auth/users/{bob_id}"),
        Some(&alice),
        Some(json!({ "username": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/auth/users/{bob_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleted_accounts_are_gone() {
    let app = app();
    let token = login(&app, "alice", "alice@example.com").await;
    let id = user_id(&app, &token).await;

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/auth/users/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _) = send(&app, "GET", &format!("/auth/users/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "identifier": "alice", "password": "hunter2-hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Recover the caller's own user id: the cart payload echoes `userId`.
async fn user_id(app: &Router, token: &str) -> String {
    let (status, body) = send(app, "GET", "/cart", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body["userId"].as_str().unwrap().to_string()
}
