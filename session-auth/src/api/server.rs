//! API server setup and configuration.

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderValue, Method, header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::api::cookies::CookieSettings;
use crate::api::routes;
use crate::auth::AuthService;
use crate::error::{Error, Result};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// The single origin allowed to call the API with credentials
    pub allowed_origin: String,
    /// Request body size limit in bytes
    pub body_limit: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 4000,
            allowed_origin: "http://localhost:5173".to_string(),
            body_limit: 64 * 1024,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Session manager
    pub auth_service: Arc<AuthService>,
    /// Attributes for the refresh cookie
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, cookies: CookieSettings) -> Self {
        Self {
            auth_service,
            cookies,
        }
    }
}

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    /// Create a new API server.
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self::with_cancel_token(config, state, CancellationToken::new())
    }

    /// Create a server that stops when `cancel_token` is cancelled.
    pub fn with_cancel_token(
        config: ApiServerConfig,
        state: AppState,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            state,
            cancel_token,
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Build the router with all middleware and routes.
    pub fn router(&self) -> Result<Router> {
        let origin = HeaderValue::from_str(&self.config.allowed_origin).map_err(|e| {
            Error::config(format!(
                "Invalid allowed origin '{}': {}",
                self.config.allowed_origin, e
            ))
        })?;
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        let router = routes::create_router(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.body_limit))
            .layer(cors)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request| {
                        if req.uri().path() == "/health" {
                            Span::none()
                        } else {
                            let mut make_span = tower_http::trace::DefaultMakeSpan::new()
                                .level(tracing::Level::INFO);
                            use tower_http::trace::MakeSpan;
                            make_span.make_span(req)
                        }
                    })
                    .on_request(|req: &Request, span: &Span| {
                        if span.is_disabled() {
                            return;
                        }
                        let mut on_request =
                            tower_http::trace::DefaultOnRequest::new().level(tracing::Level::INFO);
                        use tower_http::trace::OnRequest;
                        on_request.on_request(req, span);
                    })
                    .on_response(
                        |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                            if span.is_disabled() {
                                return;
                            }
                            let on_response = tower_http::trace::DefaultOnResponse::new()
                                .level(tracing::Level::INFO);
                            use tower_http::trace::OnResponse;
                            on_response.on_response(res, latency, span);
                        },
                    )
                    .on_failure(
                        |class: tower_http::classify::ServerErrorsFailureClass,
                         latency: Duration,
                         span: &Span| {
                            if span.is_disabled() {
                                return;
                            }
                            let mut on_failure = tower_http::trace::DefaultOnFailure::new()
                                .level(tracing::Level::ERROR);
                            use tower_http::trace::OnFailure;
                            on_failure.on_failure(class, latency, span);
                        },
                    ),
            );
        Ok(router)
    }

    /// Start the server and serve until the cancel token fires.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| Error::config(format!("Invalid address: {}", e)))?;

        let router = self.router()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Server(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!(
            allowed_origin = %self.config.allowed_origin,
            "API server listening on http://{}",
            addr
        );

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("API server shutting down...");
            })
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
