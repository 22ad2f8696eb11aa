//! Domain models for bookmarket.
//!
//! Each entity carries explicit validation functions that run before
//! persistence and return a structured list of field errors.

pub mod book;
pub mod cart;
pub mod user;
pub mod validate;

pub use book::{Book, BookDraft, ValidBook};
pub use cart::{Cart, CartItem, ItemSnapshot};
pub use user::{ProfileUpdate, ProfileUpdateInput, Registration, RegistrationInput, User};
pub use validate::{ValidationError, ValidationErrors};
