//! Authentication routes.
//!
//! The refresh secret travels in an HttpOnly cookie; the access token is only
//! ever returned in the JSON body.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, header},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::cookies;
use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::auth::{AuthError, AuthResponse};
use crate::store::models::{Role, UserRecord};
use crate::store::time::{iso_millis, seconds_until};

/// Response headers carrying one `Set-Cookie`.
type SetCookie = [(HeaderName, HeaderValue); 1];

/// Login request body.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Parse a login body. An empty body counts as `{}`; missing or `null` fields
    /// are treated as empty and other scalars are taken in their text form.
    pub fn parse(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ApiError::bad_request("Email and password are required"));
        }

        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON"))?;
        let field = |name: &str| match value.get(name) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        let request = Self {
            email: field("email").trim().to_string(),
            password: field("password"),
        };
        if request.email.is_empty() || request.password.is_empty() {
            return Err(ApiError::bad_request("Email and password are required"));
        }
        Ok(request)
    }
}

/// Public view of a user. `type` repeats `role` for older clients.
#[derive(Debug, Clone, Serialize)]
pub struct UserPayload {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(rename = "type")]
    pub user_type: Role,
}

impl From<&UserRecord> for UserPayload {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            user_type: user.role,
        }
    }
}

/// Login and refresh response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserPayload,
    /// JWT access token
    pub access_token: String,
    #[serde(with = "iso_millis")]
    pub access_token_expires_at: DateTime<Utc>,
    /// Opaque refresh secret (also set as a cookie)
    pub refresh_token: String,
    #[serde(with = "iso_millis")]
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<&AuthResponse> for LoginResponse {
    fn from(auth: &AuthResponse) -> Self {
        Self {
            user: UserPayload::from(&auth.user),
            access_token: auth.access_token.clone(),
            access_token_expires_at: auth.access_token_expires_at,
            refresh_token: auth.refresh_token.clone(),
            refresh_token_expires_at: auth.refresh_token_expires_at,
        }
    }
}

/// Session check response body. The refresh secret stays in the cookie.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserPayload,
    pub access_token: String,
    #[serde(with = "iso_millis")]
    pub access_token_expires_at: DateTime<Utc>,
}

impl From<&AuthResponse> for SessionResponse {
    fn from(auth: &AuthResponse) -> Self {
        Self {
            user: UserPayload::from(&auth.user),
            access_token: auth.access_token.clone(),
            access_token_expires_at: auth.access_token_expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/session", get(session))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

/// `Set-Cookie` carrying the refresh secret of `auth` with its remaining lifetime.
fn refresh_cookie(state: &AppState, auth: &AuthResponse) -> ApiResult<SetCookie> {
    let max_age = seconds_until(auth.refresh_token_expires_at, state.auth_service.now());
    let cookie = state.cookies.refresh_cookie(&auth.refresh_token, max_age);
    Ok([(header::SET_COOKIE, cookies::header_value(cookie)?)])
}

/// POST /auth/login
///
/// Authenticate with email and password and open a refresh session.
async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(SetCookie, Json<LoginResponse>)> {
    let request = LoginRequest::parse(&body)?;

    let response = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;

    Ok((
        refresh_cookie(&state, &response)?,
        Json(LoginResponse::from(&response)),
    ))
}

/// GET /auth/session
///
/// Restore a session from the refresh cookie and hand out a new access token.
async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<(SetCookie, Json<SessionResponse>)> {
    let token = cookies::refresh_token(&headers).unwrap_or_default();

    let response = state.auth_service.current_session(&token).await?;

    Ok((
        refresh_cookie(&state, &response)?,
        Json(SessionResponse::from(&response)),
    ))
}

/// POST /auth/refresh
///
/// Rotate the refresh cookie and issue a new access token.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<(SetCookie, Json<LoginResponse>)> {
    let token = cookies::refresh_token(&headers).unwrap_or_default();

    let response = state
        .auth_service
        .refresh(&token)
        .await
        .map_err(|e| match e {
            AuthError::NoActiveSession => ApiError::unauthorized("Invalid refresh token"),
            e => e.into(),
        })?;

    Ok((
        refresh_cookie(&state, &response)?,
        Json(LoginResponse::from(&response)),
    ))
}

/// POST /auth/logout
///
/// Revoke the session behind the refresh cookie, if any, and clear the cookie.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<(SetCookie, Json<MessageResponse>)> {
    let token = cookies::refresh_token(&headers);

    state.auth_service.logout(token.as_deref()).await?;

    let cleared = cookies::header_value(state.cookies.clear_cookie())?;
    Ok((
        [(header::SET_COOKIE, cleared)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_request() {
        let request =
            LoginRequest::parse(br#"{"email":"  prueba@usuario.com ","password":"1234"}"#).unwrap();
        assert_eq!(request.email, "prueba@usuario.com");
        assert_eq!(request.password, "1234");
    }

    #[test]
    fn test_parse_login_request_takes_scalars_as_text() {
        let request =
            LoginRequest::parse(br#"{"email":"prueba@usuario.com","password":1234}"#).unwrap();
        assert_eq!(request.password, "1234");

        let request = LoginRequest::parse(br#"{"email":"a@b.c","password":true}"#).unwrap();
        assert_eq!(request.password, "true");
    }

    #[test]
    fn test_parse_login_request_invalid_json() {
        let err = LoginRequest::parse(b"{email:").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid JSON");
    }

    #[test]
    fn test_parse_login_request_missing_fields() {
        for body in [
            &b""[..],
            b"{}",
            br#"{"email":"a@b.c"}"#,
            br#"{"email":"   ","password":"x"}"#,
            br#"{"email":"a@b.c","password":null}"#,
        ] {
            let err = LoginRequest::parse(body).unwrap_err();
            assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
            assert_eq!(err.message, "Email and password are required");
        }
    }

    #[test]
    fn test_user_payload_repeats_role_as_type() {
        let user = UserRecord::new("local@comercio.com", "Comercio", Role::Merchant, "hash");
        let json = serde_json::to_value(UserPayload::from(&user)).unwrap();
        assert_eq!(json["role"], "merchant");
        assert_eq!(json["type"], "merchant");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
