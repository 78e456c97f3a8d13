//! Repository layer over the JSON collections.
//!
//! The auth service only sees the traits, so tests can swap in spies.

pub mod session;
pub mod user;

pub use session::*;
pub use user::*;
