//! HTTP server assembly
//!
//! ```text
//! Request ──> TraceLayer ──> CorsLayer ──> Router
//!                                            ├── POST /api/link-preview
//!                                            ├── GET  /health
//!                                            ├── GET  /ready
//!                                            └── GET  /status
//! ```

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::cors::cors_layer;
use crate::error::Result;
use crate::handlers::{preview_routes, status_routes};
use crate::preview::LinkPreviewer;
use crate::state::AppState;

/// Build the application router around existing state.
pub fn router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .merge(preview_routes())
        .merge(status_routes())
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build state and router from configuration.
pub fn build_app(config: &ServerConfig) -> Result<Router> {
    let previewer = LinkPreviewer::new(config.fetch.clone())?;
    let state = Arc::new(AppState::new(previewer));
    Ok(router(state, &config.allowed_origins))
}

/// Bind and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let app = build_app(&config)?;
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
