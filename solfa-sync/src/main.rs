//! solfa-sync - Catalog Sync microservice
//!
//! Reconciles the local song catalog against Spotify: long-running sync
//! sessions stream per-song progress to the operator over SSE, queue
//! ambiguous matches for human review, and can be cancelled mid-flight.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use solfa_sync::config::SyncConfig;
use solfa_sync::services::SpotifyClient;
use solfa_sync::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("solfa_sync=info,tower_http=info")),
        )
        .init();

    info!("Starting solfa-sync (Catalog Sync) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = SyncConfig::load()?;

    info!("Database: {}", config.database_path.display());
    let db_pool = db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    let search = SpotifyClient::new(&config.spotify)?;
    let state = AppState::new(db_pool, Arc::new(search));

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
