//! Event types for the catalog sync pipeline
//!
//! A sync session emits a strictly ordered, finite sequence of `SyncEvent`s:
//! `init` first, then `start`, then interleaved per-song outcome and
//! `progress` events in processing order, and exactly one terminal event
//! (`complete`, `cancelled`, or `error`). Events serialize to the wire shape
//! consumed by the operator dashboard: a JSON object tagged with `type` and
//! camelCase payload fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One event in a sync session's progress stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// Session registered; carries the id the client needs to cancel.
    #[serde(rename_all = "camelCase")]
    Init { sync_id: String },

    /// Candidate set resolved; processing begins.
    Start { total: usize },

    /// Running counters, emitted after every processed song.
    #[serde(rename_all = "camelCase")]
    Progress {
        completed: usize,
        total: usize,
        current_song: String,
        percentage: u8,
    },

    /// High-confidence match written onto the song.
    #[serde(rename_all = "camelCase")]
    SongUpdated {
        song_id: Uuid,
        title: String,
        track_name: String,
        confidence: f32,
    },

    /// Medium-confidence match queued (or already queued) for review.
    #[serde(rename_all = "camelCase")]
    SongPending {
        song_id: Uuid,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        track_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        confidence: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// No candidate, or confidence below the review floor.
    #[serde(rename_all = "camelCase")]
    SongSkipped {
        song_id: Uuid,
        title: String,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        confidence: Option<f32>,
    },

    /// Lookup or store write failed for this song; the run continues.
    #[serde(rename_all = "camelCase")]
    SongFailed {
        song_id: Uuid,
        title: String,
        error: String,
    },

    /// Terminal: the session observed a cancellation request.
    Cancelled { message: String },

    /// Terminal: the session failed before or outside per-song processing.
    Error { error: String },

    /// Terminal: the session ran to completion (possibly with per-song failures).
    Complete { results: SyncResults },
}

impl SyncEvent {
    /// Wire name of this event, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::Init { .. } => "init",
            SyncEvent::Start { .. } => "start",
            SyncEvent::Progress { .. } => "progress",
            SyncEvent::SongUpdated { .. } => "song_updated",
            SyncEvent::SongPending { .. } => "song_pending",
            SyncEvent::SongSkipped { .. } => "song_skipped",
            SyncEvent::SongFailed { .. } => "song_failed",
            SyncEvent::Cancelled { .. } => "cancelled",
            SyncEvent::Error { .. } => "error",
            SyncEvent::Complete { .. } => "complete",
        }
    }

    /// True for the three events that end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncEvent::Cancelled { .. } | SyncEvent::Error { .. } | SyncEvent::Complete { .. }
        )
    }
}

/// Aggregate outcome counters carried by the terminal `complete` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResults {
    pub total: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
    /// Per-song failure descriptions, in processing order.
    pub errors: Vec<String>,
    /// Rounded mean confidence across songs that had a candidate.
    pub average_confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
