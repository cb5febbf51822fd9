//! Sync request options

use serde::Deserialize;
use uuid::Uuid;

/// Options accepted by the start-sync endpoint.
///
/// `min_confidence` bounds the search query ladder (the client stops probing
/// once a candidate clears it); it does not move the fixed auto-apply or
/// review thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncOptions {
    /// Explicit selection; when absent, all songs missing a Spotify link
    /// (all non-deleted songs with `force`) are processed.
    pub song_ids: Option<Vec<Uuid>>,
    /// Use the full query ladder; when false, only the exact-field query runs.
    #[serde(rename = "enableAI")]
    pub enable_ai: bool,
    /// Re-process songs that already have a Spotify link.
    pub force: bool,
    pub min_confidence: u8,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            song_ids: None,
            enable_ai: true,
            force: false,
            min_confidence: 70,
        }
    }
}
