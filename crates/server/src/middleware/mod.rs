//! HTTP middleware and extractors.

pub mod auth;

pub use auth::{AuthUser, SESSION_COOKIE, clear_session_cookie, session_cookie};
