//! Book catalog route handlers.
//!
//! Reads are public; any authenticated user may add, update or delete
//! books.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use bookmarket_core::BookId;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{BookDraft, ValidationErrors};
use crate::state::AppState;

/// `GET /books`
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let books = state.books().list_books().await?;
    Ok(Json(books))
}

/// `GET /books/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_book_id(&id)?;
    let book = state
        .books()
        .get_book(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
    Ok(Json(book))
}

/// `POST /books`
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(draft): Json<BookDraft>,
) -> Result<impl IntoResponse> {
    let book = draft.validate()?.into_book(Utc::now());
    let book = state.books().insert_book(book).await?;
    tracing::info!(book_id = %book.id, user_id = %user_id, "book added");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Book added successfully", "book": book })),
    ))
}

/// `PUT /books/{id}`
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(draft): Json<BookDraft>,
) -> Result<impl IntoResponse> {
    let id = parse_book_id(&id)?;
    let valid = draft.validate()?;

    let existing = state
        .books()
        .get_book(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

    let book = state
        .books()
        .update_book(valid.apply_to(existing, Utc::now()))
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
    tracing::info!(book_id = %book.id, user_id = %user_id, "book updated");

    Ok(Json(
        json!({ "message": "Book updated successfully", "book": book }),
    ))
}

/// `DELETE /books/{id}`
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_book_id(&id)?;
    if !state.books().delete_book(id).await? {
        return Err(AppError::NotFound("Book not found".to_string()));
    }
    tracing::info!(book_id = %id, user_id = %user_id, "book deleted");

    Ok(Json(json!({ "message": "Book deleted successfully" })))
}

fn parse_book_id(raw: &str) -> Result<BookId> {
    BookId::parse(raw).map_err(|_| {
        let mut errors = ValidationErrors::new();
        errors.push("id", "Invalid book ID");
        AppError::Validation(errors)
    })
}
