//! Sync API handlers
//!
//! POST /api/sync/stream starts a sync session and streams its events over
//! SSE; DELETE /api/sync/stream?syncId=... cancels one. The stream is
//! finite and non-restartable: it closes after the terminal event, and a
//! retry means starting a new sync.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::auth::CallerIdentity;
use crate::error::{ApiError, ApiResult};
use crate::models::SyncOptions;
use crate::services::SyncOrchestrator;
use crate::AppState;

/// Bounded event channel per session. The orchestrator blocks on a full
/// channel, so a slow SSE consumer applies backpressure instead of losing
/// events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// POST /api/sync/stream
///
/// Starts a sync session for the calling operator and returns its progress
/// stream. The session is registered (and the `init` event carrying its
/// cancellation id emitted) only after the caller has been authorized, so
/// rejected requests never leave registry residue.
pub async fn start_sync(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(options): Json<SyncOptions>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    caller.require_operator()?;

    info!(
        caller = %caller.user_id,
        force = options.force,
        min_confidence = options.min_confidence,
        "Starting catalog sync"
    );

    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let orchestrator = SyncOrchestrator::new(
        state.db.clone(),
        state.search.clone(),
        state.sessions.clone(),
    );
    let user_id = caller.user_id;
    tokio::spawn(async move {
        orchestrator.run(user_id, options, tx).await;
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let terminal = event.is_terminal();
            match solfa_common::sse::frame_event(&event) {
                Ok(frame) => yield Ok::<_, Infallible>(frame),
                Err(e) => {
                    warn!("SSE: Failed to serialize event {}: {}", event.event_type(), e);
                }
            }
            if terminal {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    ))
}

/// DELETE /api/sync/stream query parameters
#[derive(Debug, Deserialize)]
pub struct CancelQuery {
    #[serde(rename = "syncId")]
    pub sync_id: Option<String>,
}

/// DELETE /api/sync/stream?syncId=...
///
/// Signals a running session's cancellation token. The sync id is only ever
/// handed to the initiating client (in the `init` event), so possession of
/// it is the capability to cancel. Sessions that already reached a terminal
/// state are gone from the registry and report not-found.
pub async fn cancel_sync(
    State(state): State<AppState>,
    Query(query): Query<CancelQuery>,
) -> ApiResult<Json<Value>> {
    let sync_id = query
        .sync_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("syncId required".into()))?;

    if state.sessions.cancel(&sync_id).await {
        info!(sync_id = %sync_id, "Sync cancellation requested");
        Ok(Json(json!({"success": true, "message": "Sync cancelled"})))
    } else {
        Err(ApiError::NotFound("Sync not found".into()))
    }
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new().route("/api/sync/stream", post(start_sync).delete(cancel_sync))
}
