//! HTTP server lifecycle.

use std::future::Future;
use std::sync::Arc;

use cornerstone_core::{Error, Result};
use tokio::net::TcpListener;

use crate::config::ConsoleConfig;
use crate::routes;
use crate::state::AppState;

/// Open the state described by `config` and serve until `shutdown` resolves.
pub async fn serve<F>(config: &ConsoleConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState::open(config).await?);
    if state.auth.enabled {
        tracing::info!(keys = state.auth.api_keys.len(), "API-key authentication enabled");
    } else {
        tracing::warn!("API-key authentication disabled");
    }

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .map_err(|e| Error::config(format!("cannot bind {}: {e}", config.server.bind)))?;
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Listening");

    axum::serve(listener, routes::create(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
