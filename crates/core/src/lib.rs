//! Bookmarket Core - Shared domain types.
//!
//! This crate provides the typed building blocks used by the server:
//! UUID-backed entity ids, parsed email addresses, and usernames.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. This keeps it lightweight and allows it to be used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
