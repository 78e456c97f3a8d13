//! Persisted record types.
//!
//! These map one-to-one onto the JSON documents kept in the data directory.

pub mod session;
pub mod user;

pub use session::*;
pub use user::*;
