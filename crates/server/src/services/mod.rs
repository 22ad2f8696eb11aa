//! Application services.
//!
//! - [`token`] - stateless session tokens (issue/verify)
//! - [`auth`] - registration, login, and profile operations
//! - [`cart`] - the cart engine: all cart mutation logic

pub mod auth;
pub mod cart;
pub mod token;

pub use auth::{AuthError, AuthService};
pub use cart::{CartEngine, CartError};
pub use token::{TokenError, TokenService};
