//! Cart route handlers.
//!
//! Every handler requires a verified token; each operation responds with
//! the full cart after the change so clients never re-derive state.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{ItemSnapshot, ValidationErrors, validate::require_price};
use crate::services::CartError;
use crate::state::AppState;

/// Add-to-cart request body. Carries the book id plus the display
/// snapshot the client was showing when the user clicked "add".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub book_id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

impl AddItemRequest {
    /// Split into the raw book id and a validated snapshot.
    fn validate(self) -> Result<(String, ItemSnapshot)> {
        let mut errors = ValidationErrors::new();

        let book_id = match self.book_id {
            Some(id) if !id.trim().is_empty() => Some(id),
            _ => {
                errors.push("bookId", "is required");
                None
            }
        };
        let title = match self.title {
            Some(t) if !t.trim().is_empty() => Some(t),
            _ => {
                errors.push("title", "is required");
                None
            }
        };
        let author = match self.author {
            Some(a) if !a.trim().is_empty() => Some(a),
            _ => {
                errors.push("author", "is required");
                None
            }
        };
        let price = require_price(&mut errors, "price", self.price);

        errors.into_result()?;

        match (book_id, title, author, price) {
            (Some(book_id), Some(title), Some(author), Some(price)) => Ok((
                book_id,
                ItemSnapshot {
                    title,
                    author,
                    price,
                    image: self.image.unwrap_or_default(),
                },
            )),
            _ => Err(CartError::InvalidInput("Invalid request".to_string()).into()),
        }
    }
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Option<i64>,
}

/// `GET /cart`
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let cart = state.cart().get_or_create(user_id).await?;
    Ok(Json(cart))
}

/// `POST /cart/add`
pub async fn add(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(input): Json<AddItemRequest>,
) -> Result<impl IntoResponse> {
    let (book_id, snapshot) = input.validate()?;
    let cart = state.cart().add_item(user_id, &book_id, snapshot).await?;
    tracing::debug!(user_id = %user_id, book_id = %book_id, "cart item added");
    Ok(Json(cart))
}

/// `PUT /cart/update/{bookId}`
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<String>,
    Json(input): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse> {
    let quantity = input
        .quantity
        .ok_or_else(|| CartError::InvalidInput("Quantity must be at least 1".to_string()))?;
    let cart = state
        .cart()
        .update_quantity(user_id, &book_id, quantity)
        .await?;
    Ok(Json(cart))
}

/// `DELETE /cart/remove/{bookId}`
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse> {
    let cart = state.cart().remove_one_unit(user_id, &book_id).await?;
    Ok(Json(cart))
}
