//! Service assembly and the HTTP serve loop

use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::service::http::{router, ApiState};
use crate::service::league::LeagueService;
use crate::storage::RatingStore;
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Wire a store into the API state using the configured league settings
pub fn build_state<S: RatingStore>(config: &AppConfig, store: Arc<S>) -> Arc<ApiState<S>> {
    let league = LeagueService::new(store, Arc::new(SystemClock), config.league.clone());

    Arc::new(ApiState {
        service_name: config.service.name.clone(),
        league,
    })
}

/// Serve the API until `shutdown` resolves
pub async fn serve<S, F>(config: &AppConfig, store: Arc<S>, shutdown: F) -> Result<()>
where
    S: RatingStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_address();
    let app = router(build_state(config, store));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;

    info!("HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("HTTP API stopped");
    Ok(())
}
