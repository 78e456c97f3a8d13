//! session-auth library crate.
//!
//! Email/password login backed by short-lived JWT access tokens and rotating,
//! single-use refresh sessions persisted as JSON files.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;

pub use error::{Error, Result};
