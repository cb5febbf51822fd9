//! Review match API handlers
//!
//! A reviewer approves or rejects a queued match. Both transitions are
//! terminal; approving additionally projects the snapshotted Spotify fields
//! onto the song, in the same transaction as the status change, so a crash
//! between the two writes cannot leave an approved match whose song was
//! never updated.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::CallerIdentity;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{MatchStatus, SongMatch};
use crate::AppState;

/// Request body for approve/reject
#[derive(Debug, Deserialize)]
pub struct ResolveMatchRequest {
    #[serde(default, rename = "matchId")]
    pub match_id: Option<String>,
}

/// GET /api/matches query parameters
#[derive(Debug, Deserialize)]
pub struct ListMatchesQuery {
    pub status: Option<String>,
}

/// POST /api/matches/approve
pub async fn approve_match(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<ResolveMatchRequest>,
) -> ApiResult<Json<Value>> {
    resolve_match(
        &state,
        &caller,
        request,
        MatchStatus::Approved,
        "Match approved",
        "Failed to approve match",
    )
    .await
}

/// POST /api/matches/reject
pub async fn reject_match(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<ResolveMatchRequest>,
) -> ApiResult<Json<Value>> {
    resolve_match(
        &state,
        &caller,
        request,
        MatchStatus::Rejected,
        "Match rejected",
        "Failed to reject match",
    )
    .await
}

/// GET /api/matches?status=pending
///
/// Review queue listing, newest first.
pub async fn list_matches(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<ListMatchesQuery>,
) -> ApiResult<Json<Value>> {
    caller.require_operator()?;

    let status = query
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<MatchStatus>()
                .map_err(|_| ApiError::BadRequest(format!("Unknown status: {}", raw)))
        })
        .transpose()?;

    let matches = db::matches::list_matches(&state.db, status).await?;
    Ok(Json(json!({ "matches": matches })))
}

async fn resolve_match(
    state: &AppState,
    caller: &CallerIdentity,
    request: ResolveMatchRequest,
    decision: MatchStatus,
    success_message: &str,
    failure_message: &str,
) -> ApiResult<Json<Value>> {
    caller.require_operator()?;

    let raw_id = request
        .match_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("matchId is required".into()))?;
    let match_id = Uuid::parse_str(&raw_id)
        .map_err(|_| ApiError::BadRequest("matchId must be a valid id".into()))?;

    let song_match = db::matches::load_match(&state.db, match_id)
        .await
        .map_err(|e| ApiError::Adapter {
            message: failure_message.to_string(),
            details: e.to_string(),
        })?
        .ok_or_else(|| ApiError::NotFound("Match not found".into()))?;

    if song_match.status != MatchStatus::Pending {
        return Err(ApiError::Conflict("Match already resolved".into()));
    }

    match commit_resolution(&state.db, &song_match, decision, caller.user_id).await {
        Ok(true) => {
            info!(
                match_id = %match_id,
                song_id = %song_match.song_id,
                reviewer = %caller.user_id,
                decision = decision.as_str(),
                "Match resolved"
            );
            Ok(Json(json!({"success": true, "message": success_message})))
        }
        // A racing reviewer resolved it between our load and the guarded
        // update; their outcome stands.
        Ok(false) => Err(ApiError::Conflict("Match already resolved".into())),
        Err(e) => Err(ApiError::Adapter {
            message: failure_message.to_string(),
            details: e.to_string(),
        }),
    }
}

/// Apply a resolution atomically: the status transition and (for approvals)
/// the song update commit together or not at all.
async fn commit_resolution(
    db: &SqlitePool,
    song_match: &SongMatch,
    decision: MatchStatus,
    reviewer: Uuid,
) -> solfa_common::Result<bool> {
    let mut tx = db.begin().await?;

    if decision == MatchStatus::Approved {
        db::songs::apply_link(&mut *tx, song_match.song_id, &song_match.link()).await?;
    }

    let transitioned = db::matches::mark_resolved(
        &mut *tx,
        song_match.id,
        decision,
        reviewer,
        Utc::now(),
    )
    .await?;

    if transitioned {
        tx.commit().await?;
    }

    Ok(transitioned)
}

/// Build review match routes
pub fn match_routes() -> Router<AppState> {
    Router::new()
        .route("/api/matches", get(list_matches))
        .route("/api/matches/approve", post(approve_match))
        .route("/api/matches/reject", post(reject_match))
}
