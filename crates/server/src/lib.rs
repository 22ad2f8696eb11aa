//! Bookmarket server library.
//!
//! Exposes the application modules so integration tests can assemble the
//! router without going through the binary entry point.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
