//! Refresh cookie parsing and `Set-Cookie` construction.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::api::error::{ApiError, ApiResult};

/// Name of the cookie carrying the refresh secret.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Attributes shared by every refresh cookie the server sends.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    /// Add the `Secure` attribute (production only).
    pub secure: bool,
}

impl CookieSettings {
    /// `Set-Cookie` value carrying `token`, valid for `max_age_secs`.
    pub fn refresh_cookie(&self, token: &str, max_age_secs: i64) -> String {
        self.build(token, max_age_secs.max(0))
    }

    /// `Set-Cookie` value that makes the browser drop the refresh cookie.
    pub fn clear_cookie(&self) -> String {
        self.build("", 0)
    }

    fn build(&self, value: &str, max_age_secs: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            REFRESH_COOKIE, value, max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Look up a cookie in the request's `Cookie` headers.
///
/// Pairs are split on `;`, names and values trimmed and values percent-decoded.
/// Empty values count as absent.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim())
        })
        .filter(|value| !value.is_empty())
        .map(|value| match urlencoding::decode(value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value.to_string(),
        })
        .last()
}

/// The refresh secret sent by the client, if any.
pub fn refresh_token(headers: &HeaderMap) -> Option<String> {
    get_cookie(headers, REFRESH_COOKIE)
}

/// Convert a cookie string into a `Set-Cookie` header value.
pub fn header_value(cookie: String) -> ApiResult<HeaderValue> {
    HeaderValue::try_from(cookie).map_err(|e| {
        tracing::error!(error = %e, "Invalid Set-Cookie header value");
        ApiError::internal("Internal server error")
    })
}
