//! Periodic removal of expired refresh sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::service::AuthService;

/// Spawn a task that sweeps expired sessions every `interval` until cancelled.
///
/// Sweep failures are logged and retried on the next tick.
pub fn spawn_session_sweeper(
    auth_service: Arc<AuthService>,
    interval: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(interval_secs = interval.as_secs(), "Session sweeper started");
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    debug!("Session sweeper shutting down");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    match auth_service.sweep_expired().await {
                        Ok(0) => {}
                        Ok(removed) => info!(removed = removed, "Swept expired refresh sessions"),
                        Err(e) => warn!(error = %e, "Failed to sweep expired refresh sessions"),
                    }
                }
            }
        }
    })
}
