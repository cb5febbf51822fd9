//! Shared test helpers: in-memory state and a scripted search capability

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use solfa_sync::db;
use solfa_sync::models::{Song, TrackCandidate};
use solfa_sync::services::{SearchError, SearchOptions, TrackSearch};
use solfa_sync::AppState;

/// What the scripted search returns for one song title.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Candidates(Vec<TrackCandidate>),
    Failure(String),
}

struct Gate {
    /// 1-based call number the gate blocks.
    call: usize,
    entered: Arc<Notify>,
    proceed: Arc<Notify>,
}

/// Deterministic `TrackSearch` for tests.
///
/// Responses are keyed by song title; unscripted songs return no
/// candidates. A gate can hold one call open so tests can act (e.g. cancel
/// the session) while that song's lookup is provably in flight.
#[derive(Default)]
pub struct ScriptedSearch {
    responses: Mutex<HashMap<String, ScriptedResponse>>,
    calls: AtomicUsize,
    gate: Mutex<Option<Gate>>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidates(self, title: &str, candidates: Vec<TrackCandidate>) -> Self {
        self.responses.lock().unwrap().insert(
            title.to_string(),
            ScriptedResponse::Candidates(candidates),
        );
        self
    }

    pub fn with_candidate(self, title: &str, candidate: TrackCandidate) -> Self {
        self.with_candidates(title, vec![candidate])
    }

    pub fn with_failure(self, title: &str, message: &str) -> Self {
        self.responses.lock().unwrap().insert(
            title.to_string(),
            ScriptedResponse::Failure(message.to_string()),
        );
        self
    }

    /// Block the nth search call (1-based) until the test releases it.
    /// Returns (entered, proceed): `entered` fires when the call arrives,
    /// `proceed` lets it continue.
    pub fn gate_call(&self, call: usize) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let proceed = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Gate {
            call,
            entered: entered.clone(),
            proceed: proceed.clone(),
        });
        (entered, proceed)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackSearch for ScriptedSearch {
    async fn search(
        &self,
        song: &Song,
        _options: &SearchOptions,
    ) -> Result<Vec<TrackCandidate>, SearchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let gate = {
            let guard = self.gate.lock().unwrap();
            guard
                .as_ref()
                .filter(|g| g.call == call)
                .map(|g| (g.entered.clone(), g.proceed.clone()))
        };
        if let Some((entered, proceed)) = gate {
            entered.notify_one();
            proceed.notified().await;
        }

        let response = self.responses.lock().unwrap().get(&song.title).cloned();
        match response {
            Some(ScriptedResponse::Failure(message)) => Err(SearchError::Network(message)),
            Some(ScriptedResponse::Candidates(candidates)) => Ok(candidates),
            None => Ok(Vec::new()),
        }
    }
}

/// A candidate with the given confidence and sensible defaults.
pub fn candidate(track_name: &str, confidence: f32) -> TrackCandidate {
    TrackCandidate {
        track_id: format!("track-{}", track_name.to_lowercase().replace(' ', "-")),
        track_name: track_name.to_string(),
        artist_name: "Bill Evans".to_string(),
        album_name: "Portrait in Jazz".to_string(),
        spotify_url: format!(
            "https://open.spotify.com/track/{}",
            track_name.to_lowercase().replace(' ', "")
        ),
        preview_url: None,
        cover_image_url: Some("https://i.scdn.co/image/cover".to_string()),
        duration_ms: Some(321_000),
        release_date: Some("1960-01-15".to_string()),
        popularity: Some(55),
        confidence,
        search_query: format!("track:\"{}\"", track_name),
        match_reason: format!("Found via query: track:\"{}\"", track_name),
    }
}

/// Fresh in-memory pool with the service schema.
///
/// Capped at one connection: each in-memory SQLite connection is its own
/// database, so a wider pool would hand out empty databases.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    db::init_tables(&pool).await.expect("schema");
    pool
}

/// App state over an in-memory pool and the given search capability.
pub async fn test_state(search: Arc<dyn TrackSearch>) -> AppState {
    AppState::new(test_pool().await, search)
}

/// Insert a song with no Spotify link.
pub async fn seed_song(pool: &SqlitePool, title: &str, author: Option<&str>) -> Song {
    let song = Song::new(title, author.map(str::to_string));
    db::songs::save_song(pool, &song).await.expect("seed song");
    song
}
