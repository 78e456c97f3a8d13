//! HTTP API: auth routes, cookies, error mapping and server lifecycle.

pub mod cookies;
pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{ApiServer, ApiServerConfig, AppState};
