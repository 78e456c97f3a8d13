//! Credential checks, access tokens and refresh sessions.

pub mod jwt;
pub mod password;
pub mod service;
pub mod sweeper;

pub use jwt::{Claims, IssuedToken, JwtService, TokenError};
pub use service::{AuthConfig, AuthError, AuthResponse, AuthService, ResolvedSession};
pub use sweeper::spawn_session_sweeper;
