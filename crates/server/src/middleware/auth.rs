//! Authentication middleware and extractors.
//!
//! Provides an extractor that requires a valid bearer token before a route
//! handler runs, plus helpers for the session cookie.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use bookmarket_core::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the session cookie carrying the token.
pub const SESSION_COOKIE: &str = "token";

/// Extractor that requires a verified token.
///
/// Looks for the token in the `Authorization` header (with or without a
/// `Bearer ` prefix) and falls back to the `token` cookie. Rejects with
/// 401 when the token is absent, invalid or expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     AuthUser(user_id): AuthUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {user_id}!")
/// }
/// ```
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or(AppError::Unauthenticated)?;

        let state = AppState::from_ref(state);
        let user_id = state.tokens().verify(&token)?;

        Ok(Self(user_id))
    }
}

/// Pull the token out of the request, header first, then cookie.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION)
        && let Ok(value) = value.to_str()
    {
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    cookie_value(parts, SESSION_COOKIE)
}

fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    for value in parts.headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for pair in value.split(';') {
            if let Some((key, val)) = pair.trim().split_once('=')
                && key == name
                && !val.is_empty()
            {
                return Some(val.to_string());
            }
        }
    }
    None
}

/// Build the `Set-Cookie` value that stores a freshly issued token.
///
/// `HttpOnly` and `SameSite=Strict` always; `Secure` only when the server
/// is reachable over HTTPS, so local development still works.
#[must_use]
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; Max-Age=3600; HttpOnly; SameSite=Strict");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the `Set-Cookie` value that clears the session cookie (logout).
#[must_use]
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Strict");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_name: header::HeaderName, value: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .header(header_name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn bearer_prefix_is_optional() {
        let parts = parts_with(header::AUTHORIZATION, "Bearer abc.def.ghi");
        assert_eq!(extract_token(&parts).unwrap(), "abc.def.ghi");

        let parts = parts_with(header::AUTHORIZATION, "abc.def.ghi");
        assert_eq!(extract_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn cookie_fallback_finds_the_token() {
        let parts = parts_with(header::COOKIE, "theme=dark; token=abc.def.ghi; lang=en");
        assert_eq!(extract_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn header_wins_over_cookie() {
        let (parts, ()) = Request::builder()
            .header(header::AUTHORIZATION, "Bearer from-header")
            .header(header::COOKIE, "token=from-cookie")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(extract_token(&parts).unwrap(), "from-header");
    }

    #[test]
    fn missing_or_empty_tokens_are_none() {
        let (parts, ()) = Request::builder().body(()).unwrap().into_parts();
        assert!(extract_token(&parts).is_none());

        let parts = parts_with(header::COOKIE, "token=");
        assert!(extract_token(&parts).is_none());
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc", false);
        assert_eq!(
            cookie,
            "token=abc; Path=/; Max-Age=3600; HttpOnly; SameSite=Strict"
        );
        assert!(session_cookie("abc", true).ends_with("; Secure"));

        let cleared = clear_session_cookie(false);
        assert!(cleared.contains("Max-Age=0"));
    }
}
