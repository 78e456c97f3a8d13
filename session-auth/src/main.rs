use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use session_auth::api::{ApiServer, AppState};
use session_auth::auth::{AuthService, JwtService, spawn_session_sweeper};
use session_auth::config::AppConfig;
use session_auth::logging;
use session_auth::store::{CredentialStore, seed, time::SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Existing environment variables win over .env entries
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    let _log_guard = logging::init_logging(&config.log_dir).context("initializing logging")?;

    if config.uses_default_secret() {
        warn!("ACCESS_TOKEN_SECRET is not set; using the development signing secret");
    }

    let store = CredentialStore::open(&config.data_dir)
        .await
        .context("opening credential store")?;

    let seeded = seed::seed_default_users(store.users().as_ref())
        .await
        .context("seeding default users")?;
    if seeded > 0 {
        info!(count = seeded, "Default users created");
    }

    let jwt_service = Arc::new(JwtService::new(
        &config.access_token_secret,
        config.auth.access_token_ttl_secs,
    ));
    let auth_service = Arc::new(AuthService::new(
        store.users(),
        store.sessions(),
        jwt_service,
        Arc::new(SystemClock),
        config.auth.clone(),
    ));

    let swept = auth_service
        .sweep_expired()
        .await
        .context("sweeping expired sessions")?;
    info!(removed = swept, "Startup session sweep complete");

    let cancel_token = CancellationToken::new();

    let sweeper = config.sweep_interval.map(|interval| {
        spawn_session_sweeper(auth_service.clone(), interval, cancel_token.child_token())
    });

    let shutdown = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        info!("Shutdown signal received");
        shutdown.cancel();
    });

    let state = AppState::new(auth_service, config.cookie_settings());
    let server = ApiServer::with_cancel_token(config.server.clone(), state, cancel_token.clone());
    let result = server.run().await;

    // Stop background work whether the server exited cleanly or not
    cancel_token.cancel();
    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }

    result.context("running API server")?;
    info!("session-auth stopped");
    Ok(())
}
