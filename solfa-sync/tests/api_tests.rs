//! HTTP API integration tests
//!
//! Exercise the real router with `tower::ServiceExt::oneshot`: auth
//! rejection shapes, match resolution flows, sync cancellation, and the
//! SSE sync stream end to end.

mod helpers;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use helpers::{candidate, seed_song, test_state, ScriptedSearch};
use solfa_common::events::SyncEvent;
use solfa_sync::api::auth::{ROLES_HEADER, USER_HEADER};
use solfa_sync::db;
use solfa_sync::models::{MatchStatus, Song, SongMatch};
use solfa_sync::{build_router, AppState};

async fn empty_state() -> AppState {
    test_state(Arc::new(ScriptedSearch::new())).await
}

fn json_request(
    method: Method,
    uri: &str,
    identity: Option<(Uuid, &str)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, roles)) = identity {
        builder = builder
            .header(USER_HEADER, user.to_string())
            .header(ROLES_HEADER, roles);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_pending_match(pool: &sqlx::SqlitePool) -> (Song, SongMatch) {
    let song = seed_song(pool, "Israel", Some("Bill Evans")).await;
    let song_match = SongMatch::from_candidate(song.id, &candidate("Israel", 60.0));
    assert!(db::matches::queue_match(pool, &song_match).await.unwrap());
    (song, song_match)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reject_requires_identity() {
    let app = build_router(empty_state().await);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/matches/reject",
            None,
            Some(json!({"matchId": Uuid::new_v4()})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn test_reject_requires_operator_role() {
    let app = build_router(empty_state().await);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/matches/reject",
            Some((Uuid::new_v4(), "student")),
            Some(json!({"matchId": Uuid::new_v4()})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({"error": "Forbidden"}));
}

#[tokio::test]
async fn test_sync_stream_rejects_before_registering_session() {
    let state = empty_state().await;
    let sessions = state.sessions.clone();
    let app = build_router(state);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/sync/stream",
            Some((Uuid::new_v4(), "student")),
            Some(json!({})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(sessions.active_count().await, 0);
}

// ---------------------------------------------------------------------------
// Match resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reject_requires_match_id() {
    let app = build_router(empty_state().await);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/matches/reject",
            Some((Uuid::new_v4(), "admin")),
            Some(json!({})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "matchId is required"})
    );
}

#[tokio::test]
async fn test_reject_rejects_malformed_match_id() {
    let app = build_router(empty_state().await);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/matches/reject",
            Some((Uuid::new_v4(), "admin")),
            Some(json!({"matchId": "not-a-uuid"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reject_unknown_match_is_not_found() {
    let app = build_router(empty_state().await);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/matches/reject",
            Some((Uuid::new_v4(), "admin")),
            Some(json!({"matchId": Uuid::new_v4()})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Match not found"}));
}

#[tokio::test]
async fn test_reject_leaves_song_untouched() {
    let state = empty_state().await;
    let (song, song_match) = seed_pending_match(&state.db).await;
    let pool = state.db.clone();
    let app = build_router(state);

    let reviewer = Uuid::new_v4();
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/matches/reject",
            Some((reviewer, "teacher")),
            Some(json!({"matchId": song_match.id})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"success": true, "message": "Match rejected"})
    );

    let resolved = db::matches::load_match(&pool, song_match.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.status, MatchStatus::Rejected);
    assert_eq!(resolved.reviewed_by, Some(reviewer));
    assert!(resolved.reviewed_at.is_some());

    // Rejection never writes through to the song.
    let untouched = db::songs::get_song(&pool, song.id).await.unwrap().unwrap();
    assert!(untouched.spotify_url.is_none());
}

#[tokio::test]
async fn test_approve_writes_through_to_song() {
    let state = empty_state().await;
    let (song, song_match) = seed_pending_match(&state.db).await;
    let pool = state.db.clone();
    let app = build_router(state);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/matches/approve",
            Some((Uuid::new_v4(), "admin")),
            Some(json!({"matchId": song_match.id})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"success": true, "message": "Match approved"})
    );

    let resolved = db::matches::load_match(&pool, song_match.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.status, MatchStatus::Approved);

    // The snapshotted candidate fields landed on the song.
    let updated = db::songs::get_song(&pool, song.id).await.unwrap().unwrap();
    assert_eq!(updated.spotify_url.as_deref(), Some(song_match.spotify_url.as_str()));
    assert_eq!(updated.duration_ms, song_match.duration_ms);
    assert_eq!(updated.release_year, Some(1960));
    assert_eq!(updated.author.as_deref(), Some("Bill Evans"));
}

#[tokio::test]
async fn test_resolution_is_one_way() {
    let state = empty_state().await;
    let (_, song_match) = seed_pending_match(&state.db).await;
    let pool = state.db.clone();
    let app = build_router(state);

    let first_reviewer = Uuid::new_v4();
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/matches/reject",
            Some((first_reviewer, "admin")),
            Some(json!({"matchId": song_match.id})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A second resolution attempt conflicts and changes nothing.
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/matches/approve",
            Some((Uuid::new_v4(), "admin")),
            Some(json!({"matchId": song_match.id})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Match already resolved"})
    );

    let resolved = db::matches::load_match(&pool, song_match.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.status, MatchStatus::Rejected);
    assert_eq!(resolved.reviewed_by, Some(first_reviewer));
}

#[tokio::test]
async fn test_list_matches_filters_by_status() {
    let state = empty_state().await;
    let (_, song_match) = seed_pending_match(&state.db).await;
    let app = build_router(state);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::GET,
            "/api/matches?status=pending",
            Some((Uuid::new_v4(), "teacher")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["id"], json!(song_match.id));
    assert_eq!(matches[0]["status"], json!("pending"));

    let response = app
        .oneshot(json_request(
            Method::GET,
            "/api/matches?status=bogus",
            Some((Uuid::new_v4(), "teacher")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Sync stream and cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cancel_requires_sync_id() {
    let app = build_router(empty_state().await);

    let response = app
        .oneshot(json_request(Method::DELETE, "/api/sync/stream", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "syncId required"}));
}

#[tokio::test]
async fn test_cancel_unknown_sync_is_not_found() {
    let app = build_router(empty_state().await);

    let response = app
        .oneshot(json_request(
            Method::DELETE,
            "/api/sync/stream?syncId=nope",
            None,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Sync not found"}));
}

#[tokio::test]
async fn test_cancel_signals_live_session() {
    let state = empty_state().await;
    let token = state.sessions.register("caller-123").await.unwrap();
    let app = build_router(state);

    let response = app
        .oneshot(json_request(
            Method::DELETE,
            "/api/sync/stream?syncId=caller-123",
            None,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"success": true, "message": "Sync cancelled"})
    );
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn test_sync_stream_end_to_end() {
    let search = Arc::new(
        ScriptedSearch::new().with_candidate("Beautiful Love", candidate("Beautiful Love", 92.0)),
    );
    let state = test_state(search).await;
    let song = seed_song(&state.db, "Beautiful Love", Some("Bill Evans")).await;
    let pool = state.db.clone();
    let sessions = state.sessions.clone();
    let app = build_router(state);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/sync/stream",
            Some((Uuid::new_v4(), "admin")),
            Some(json!({"minConfidence": 70})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("text/event-stream"));

    // The stream is finite: collecting the body completes once the terminal
    // event has been sent.
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    let events: Vec<SyncEvent> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("event json"))
        .collect();

    let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec!["init", "start", "song_updated", "progress", "complete"]
    );

    // Write-through happened and the session is gone.
    let updated = db::songs::get_song(&pool, song.id).await.unwrap().unwrap();
    assert!(updated.spotify_url.is_some());
    assert_eq!(sessions.active_count().await, 0);
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_router(empty_state().await);

    let response = app
        .oneshot(json_request(Method::GET, "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["module"], json!("solfa-sync"));
    assert_eq!(body["active_syncs"], json!(0));
}
