//! External track search capability
//!
//! The orchestrator consumes candidate lookups through this trait so the
//! pipeline can be driven by the real Spotify client in production and by
//! scripted implementations in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Song, TrackCandidate};

/// Search errors
///
/// All variants surface as a per-song failure in the pipeline; none aborts
/// a sync session.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Search request timed out")]
    Timeout,

    #[error("Authentication with the catalog failed: {0}")]
    Credentials(String),

    #[error("Catalog API error {0}: {1}")]
    Api(u16, String),

    #[error("Unexpected catalog response: {0}")]
    Parse(String),
}

/// Knobs the orchestrator passes through per sync run.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of query ladder rungs to try per song.
    pub max_queries: usize,
    /// Stop descending the ladder once a candidate reaches this confidence.
    pub min_confidence: u8,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_queries: 4,
            min_confidence: 70,
        }
    }
}

/// A source of scored track candidates for catalog songs.
#[async_trait]
pub trait TrackSearch: Send + Sync {
    /// Look up candidates for one song. An empty vec means "no result",
    /// which the decision engine maps to a skip.
    async fn search(
        &self,
        song: &Song,
        options: &SearchOptions,
    ) -> Result<Vec<TrackCandidate>, SearchError>;
}
