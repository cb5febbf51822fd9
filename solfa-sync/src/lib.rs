//! solfa-sync library interface
//!
//! Exposes the router, state, and pipeline internals for integration
//! testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{SessionRegistry, TrackSearch};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Track search capability (Spotify in production, scripted in tests)
    pub search: Arc<dyn TrackSearch>,
    /// Registry of in-flight sync sessions
    pub sessions: SessionRegistry,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, search: Arc<dyn TrackSearch>) -> Self {
        Self {
            db,
            search,
            sessions: SessionRegistry::new(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::sync_routes())
        .merge(api::match_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
