//! Process configuration loaded from the environment.
//!
//! Every value has a development default; numeric values that fail to parse fall
//! back to their default.

use std::path::PathBuf;
use std::time::Duration;

use crate::api::cookies::CookieSettings;
use crate::api::server::ApiServerConfig;
use crate::auth::AuthConfig;

/// Signing secret used when `ACCESS_TOKEN_SECRET` is unset.
pub const DEFAULT_ACCESS_TOKEN_SECRET: &str = "dev-access-secret";

const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 20;
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 14;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ApiServerConfig,
    pub auth: AuthConfig,
    /// HMAC key for access tokens
    pub access_token_secret: String,
    /// `APP_ENV=production`
    pub production: bool,
    /// Directory holding `users.json` and `sessions.json`
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Period of the background expiry sweep; `None` disables it
    pub sweep_interval: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BIND_ADDRESS`: listen address (default: 0.0.0.0)
    /// - `PORT`: listen port (default: 4000)
    /// - `CLIENT_URL`: origin allowed by CORS (default: http://localhost:5173)
    /// - `ACCESS_TOKEN_SECRET`: access token signing key (default: a development key)
    /// - `ACCESS_TOKEN_TTL_MINUTES`: access token lifetime (default: 20, at least 1)
    /// - `REFRESH_TOKEN_TTL_DAYS`: refresh session lifetime (default: 14, at least 1)
    /// - `APP_ENV`: `production` marks the refresh cookie `Secure`
    /// - `DATA_DIR`: credential store directory (default: data)
    /// - `LOG_DIR`: log file directory (default: logs)
    /// - `SESSION_SWEEP_INTERVAL_SECS`: background sweep period, 0 disables (default: 3600)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut server = ApiServerConfig::default();
        if let Some(bind_address) = var("BIND_ADDRESS") {
            server.bind_address = bind_address;
        }
        if let Some(port) = var("PORT")
            && let Ok(parsed) = port.parse::<u16>()
        {
            server.port = parsed;
        }
        if let Some(origin) = var("CLIENT_URL") {
            server.allowed_origin = origin;
        }

        let access_minutes = var("ACCESS_TOKEN_TTL_MINUTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_MINUTES);
        let refresh_days = var("REFRESH_TOKEN_TTL_DAYS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_DAYS);

        let production = var("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));

        let sweep_secs = var("SESSION_SWEEP_INTERVAL_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);

        Self {
            server,
            auth: AuthConfig::from_ttls(access_minutes, refresh_days),
            access_token_secret: var("ACCESS_TOKEN_SECRET")
                .unwrap_or_else(|| DEFAULT_ACCESS_TOKEN_SECRET.to_string()),
            production,
            data_dir: var("DATA_DIR").map(PathBuf::from).unwrap_or_else(|| "data".into()),
            log_dir: var("LOG_DIR").map(PathBuf::from).unwrap_or_else(|| "logs".into()),
            sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
        }
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: self.production,
        }
    }

    /// Whether the development signing secret is in use.
    pub fn uses_default_secret(&self) -> bool {
        self.access_token_secret == DEFAULT_ACCESS_TOKEN_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.allowed_origin, "http://localhost:5173");
        assert_eq!(config.auth.access_token_ttl_secs, 1200);
        assert_eq!(config.auth.refresh_token_ttl_secs, 14 * 86400);
        assert!(config.uses_default_secret());
        assert!(!config.production);
        assert!(!config.cookie_settings().secure);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("CLIENT_URL", "https://app.example.com"),
            ("ACCESS_TOKEN_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_MINUTES", "5"),
            ("REFRESH_TOKEN_TTL_DAYS", "30"),
            ("APP_ENV", "Production"),
            ("DATA_DIR", "/var/lib/session-auth"),
            ("SESSION_SWEEP_INTERVAL_SECS", "0"),
        ]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.allowed_origin, "https://app.example.com");
        assert_eq!(config.access_token_secret, "s3cret");
        assert!(!config.uses_default_secret());
        assert_eq!(config.auth.access_token_ttl_secs, 300);
        assert_eq!(config.auth.refresh_token_ttl_secs, 30 * 86400);
        assert!(config.cookie_settings().secure);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/session-auth"));
        assert_eq!(config.sweep_interval, None);
    }

    #[test]
    fn test_invalid_and_small_values() {
        let config = config(&[
            ("PORT", "not-a-port"),
            ("ACCESS_TOKEN_TTL_MINUTES", "0"),
            ("REFRESH_TOKEN_TTL_DAYS", "abc"),
            ("ACCESS_TOKEN_SECRET", "   "),
        ]);
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.access_token_ttl_secs, 60);
        assert_eq!(config.auth.refresh_token_ttl_secs, 14 * 86400);
        assert!(config.uses_default_secret());
    }
}
