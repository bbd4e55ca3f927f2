/*!
 * HTTP API.
 *
 * - `POST /api/translate`: translate a presentation in place
 * - `GET|POST /api/progress/{job_id}`: read or record job progress
 * - `GET /api/test-credentials`: credential diagnostics
 * - `GET /health`: liveness
 */

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::progress::{InMemoryProgressStore, ProgressTracker};
use crate::translation::PresentationTranslator;

pub mod error;
pub mod handlers;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Absent when the Google clients could not be built at startup
    pub translator: Option<Arc<PresentationTranslator>>,
    pub progress: Arc<dyn ProgressTracker>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        translator: Option<PresentationTranslator>,
        progress: Arc<dyn ProgressTracker>,
        config: Config,
    ) -> Self {
        Self {
            translator: translator.map(Arc::new),
            progress,
            config: Arc::new(config),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/translate",
            post(handlers::translate).fallback(error::method_not_allowed),
        )
        .route(
            "/api/progress/{job_id}",
            get(handlers::get_progress)
                .post(handlers::post_progress)
                .fallback(error::method_not_allowed),
        )
        .route(
            "/api/test-credentials",
            get(handlers::test_credentials).fallback(error::method_not_allowed),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Run the HTTP server until interrupted
pub async fn serve(config: Config) -> Result<()> {
    let store = Arc::new(InMemoryProgressStore::new(Duration::from_secs(config.progress.ttl_secs)));
    let _sweeper = store.spawn_sweeper(Duration::from_secs(config.progress.sweep_interval_secs));
    let progress: Arc<dyn ProgressTracker> = store;

    let translator = match PresentationTranslator::from_config(&config, progress.clone()) {
        Ok(translator) => Some(translator),
        Err(e) => {
            error!("Google clients unavailable, translation requests will fail: {}", e);
            None
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(translator, progress, config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
