//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Responses carry a JSON body of the shape
//! `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::models::ValidationErrors;
use crate::services::{AuthError, CartError, TokenError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Request fields failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// No token on the request.
    #[error("No token provided")]
    Unauthenticated,

    /// Token present but not verifiable.
    #[error("Invalid token")]
    InvalidToken,

    /// Token verified but past its expiry.
    #[error("Token expired")]
    TokenExpired,

    /// Authenticated user acting on another user's resources.
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Invalid => Self::InvalidToken,
            TokenError::Creation(msg) => Self::Internal(msg),
        }
    }
}

impl AppError {
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Store(_)
                | Self::Internal(_)
                | Self::Auth(AuthError::Store(_) | AuthError::PasswordHash)
                | Self::Cart(CartError::Store(_))
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::Validation(_) | AuthError::InvalidCredentials | AuthError::Taken(_) => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::PasswordHash | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Cart(err) => match err {
                CartError::InvalidInput(_)
                | CartError::BookNotFound
                | CartError::ItemNotFound => StatusCode::BAD_REQUEST,
                CartError::CartNotFound => StatusCode::NOT_FOUND,
                CartError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    // Don't expose internal error details to clients.
    fn message(&self) -> String {
        match self {
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::Validation(errors) => errors.to_string(),
                AuthError::InvalidCredentials => "Invalid username or password".to_string(),
                AuthError::Taken(msg) => msg.clone(),
                AuthError::UserNotFound => "User not found".to_string(),
                AuthError::PasswordHash | AuthError::Store(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Cart(err) => match err {
                CartError::InvalidInput(msg) => msg.clone(),
                CartError::BookNotFound => "Invalid book ID".to_string(),
                CartError::CartNotFound => "Cart not found".to_string(),
                CartError::ItemNotFound => "Item not found in cart".to_string(),
                CartError::Store(_) => "Internal server error".to_string(),
            },
            Self::Validation(errors) => errors.to_string(),
            Self::Unauthenticated => "Access denied. No token provided.".to_string(),
            Self::InvalidToken => "Invalid token".to_string(),
            Self::TokenExpired => "Session expired. Please log in again.".to_string(),
            Self::Forbidden => "You can only modify your own account".to_string(),
            Self::NotFound(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({ "error": self.message() }));
        (self.status(), body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_token_error_status_codes() {
        assert_eq!(get_status(AppError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::TokenExpired), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::Taken("Username already taken".to_string()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::UserNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::PasswordHash)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_cart_error_status_codes() {
        assert_eq!(
            get_status(AppError::Cart(CartError::BookNotFound)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::ItemNotFound)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::CartNotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_messages_hide_internal_details() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.message(), "Internal server error");

        let err = AppError::Unauthenticated;
        assert_eq!(err.message(), "Access denied. No token provided.");

        let err = AppError::TokenExpired;
        assert_eq!(err.message(), "Session expired. Please log in again.");
    }
}
