//! Authentication route handlers.
//!
//! Registration, login/logout and profile management. Login issues a
//! bearer token which is also mirrored into an `HttpOnly` session cookie
//! for browser clients.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;
use serde_json::json;

use bookmarket_core::UserId;

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, clear_session_cookie, session_cookie};
use crate::models::{ProfileUpdateInput, RegistrationInput, ValidationErrors};
use crate::state::AppState;

/// Login request body. `identifier` is a username or email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: Option<String>,
    pub password: Option<String>,
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegistrationInput>,
) -> Result<impl IntoResponse> {
    let user = state.auth().register(input).await?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let identifier = input.identifier.unwrap_or_default();
    let password = input.password.unwrap_or_default();

    let user = state.auth().login(&identifier, &password).await?;
    let token = state.tokens().issue(user.id)?;
    tracing::info!(user_id = %user.id, "user logged in");

    let cookie = session_cookie(&token, state.config().cookie_secure());
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "message": "Login successful", "token": token })),
    ))
}

/// `POST /auth/logout`
///
/// Tokens are stateless, so logout only clears the session cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_session_cookie(state.config().cookie_secure());
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

/// `GET /auth/users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_user_id(&id)?;
    let user = state.auth().get_user(id).await?;
    Ok(Json(user))
}

/// `PUT /auth/users/{id}`
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(requester): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<ProfileUpdateInput>,
) -> Result<impl IntoResponse> {
    let id = parse_user_id(&id)?;
    if requester != id {
        return Err(AppError::Forbidden);
    }

    let user = state.auth().update_profile(id, input).await?;
    tracing::info!(user_id = %user.id, "profile updated");

    Ok(Json(
        json!({ "message": "User updated successfully", "user": user }),
    ))
}

/// `DELETE /auth/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(requester): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_user_id(&id)?;
    if requester != id {
        return Err(AppError::Forbidden);
    }

    state.auth().delete_user(id).await?;
    tracing::info!(user_id = %id, "account deleted");

    Ok(Json(json!({ "message": "User deleted successfully" })))
}

fn parse_user_id(raw: &str) -> Result<UserId> {
    UserId::parse(raw).map_err(|_| {
        let mut errors = ValidationErrors::new();
        errors.push("id", "Invalid user ID");
        AppError::Validation(errors)
    })
}
