//! Spotify Web API client
//!
//! Implements `TrackSearch` against Spotify's client-credentials flow and
//! `/v1/search` endpoint. Each song is probed with a ladder of query shapes,
//! from strict field-qualified to loose free-text; every returned track is
//! scored 0-100 from title similarity (60%), artist similarity (30%), and
//! popularity (10%). The ladder stops early once a candidate clears the
//! caller's confidence floor, which keeps request volume down under
//! Spotify's rate limits.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::SpotifyConfig;
use crate::models::{Song, TrackCandidate};
use crate::services::search::{SearchError, SearchOptions, TrackSearch};

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_SEARCH_URL: &str = "https://api.spotify.com/v1/search";
const USER_AGENT: &str = "solfa-sync/0.1.0 (catalog reconciliation)";

/// Tracks requested per query; the scorer ranks them, the pipeline keeps the best.
const SEARCH_RESULT_LIMIT: &str = "5";

/// Refresh the cached token this long before Spotify's stated expiry.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// Rate limiter enforcing a minimum interval between catalog requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Spotify Web API client with token caching and rate limiting.
pub struct SpotifyClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
    rate_limiter: RateLimiter,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Result<Self, SearchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Mutex::new(None),
            rate_limiter: RateLimiter::new(config.rate_limit_ms),
        })
    }

    /// Fetch (or reuse) a client-credentials access token.
    async fn access_token(&self) -> Result<String, SearchError> {
        let mut token = self.token.lock().await;

        if let Some(cached) = token.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        tracing::debug!("Requesting Spotify access token");
        let response = self
            .http_client
            .post(SPOTIFY_TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(SearchError::Credentials(format!(
                "Token endpoint returned {}",
                response.status()
            )));
        }

        let grant: TokenResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let access_token = grant.access_token.clone();
        let lifetime = grant.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
        *token = Some(CachedToken {
            access_token: grant.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });

        Ok(access_token)
    }

    /// Run one search query against /v1/search.
    async fn search_tracks(&self, query: &str) -> Result<Vec<SpotifyTrack>, SearchError> {
        self.rate_limiter.wait().await;
        let token = self.access_token().await?;

        tracing::debug!(query = %query, "Querying Spotify search API");

        let response = self
            .http_client
            .get(SPOTIFY_SEARCH_URL)
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("type", "track"),
                ("limit", SEARCH_RESULT_LIMIT),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api(
                status.as_u16(),
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(body.tracks.items)
    }
}

#[async_trait]
impl TrackSearch for SpotifyClient {
    async fn search(
        &self,
        song: &Song,
        options: &SearchOptions,
    ) -> Result<Vec<TrackCandidate>, SearchError> {
        let queries = build_queries(song);
        let mut candidates: Vec<TrackCandidate> = Vec::new();

        for query in queries.iter().take(options.max_queries.max(1)) {
            let tracks = self.search_tracks(query).await?;
            for track in &tracks {
                if let Some(candidate) = score_track(song, track, query) {
                    candidates.push(candidate);
                }
            }

            let floor = options.min_confidence as f32;
            if candidates.iter().any(|c| c.confidence >= floor) {
                tracing::debug!(
                    song = %song.title,
                    "Candidate cleared confidence floor, stopping query ladder"
                );
                break;
            }
        }

        Ok(candidates)
    }
}

fn map_transport_error(error: reqwest::Error) -> SearchError {
    if error.is_timeout() {
        SearchError::Timeout
    } else {
        SearchError::Network(error.to_string())
    }
}

/// Query ladder for one song, strictest first.
fn build_queries(song: &Song) -> Vec<String> {
    let mut queries = Vec::new();
    let mut push = |q: String| {
        if !queries.contains(&q) {
            queries.push(q);
        }
    };

    match song.author.as_deref().filter(|a| !a.trim().is_empty()) {
        Some(author) => {
            push(format!("track:\"{}\" artist:\"{}\"", song.title, author));
            push(format!("{} {}", song.title, author));
            push(format!("\"{}\"", song.title));
            push(format!("artist:\"{}\"", author));
        }
        None => {
            push(format!("track:\"{}\"", song.title));
            push(format!("\"{}\"", song.title));
        }
    }

    queries
}

/// Score one returned track against the song.
///
/// Returns `None` for tracks without a public Spotify URL; the whole point
/// of a match is the link, so an unlinked track can never be applied.
fn score_track(song: &Song, track: &SpotifyTrack, query: &str) -> Option<TrackCandidate> {
    let spotify_url = track.external_urls.spotify.clone()?;

    let title_similarity = similarity(&song.title, &track.name);
    let artists_joined = track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let artist_similarity = similarity(song.author.as_deref().unwrap_or(""), &artists_joined);
    let popularity = track.popularity.unwrap_or(0) as f32;

    let confidence = (title_similarity * 0.6 + artist_similarity * 0.3 + popularity * 0.1)
        .round()
        .clamp(0.0, 100.0);

    Some(TrackCandidate {
        track_id: track.id.clone(),
        track_name: track.name.clone(),
        artist_name: track
            .artists
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        album_name: track.album.name.clone(),
        spotify_url,
        preview_url: track.preview_url.clone(),
        cover_image_url: track.album.images.first().map(|i| i.url.clone()),
        duration_ms: track.duration_ms,
        release_date: track.album.release_date.clone(),
        popularity: track.popularity,
        confidence,
        search_query: query.to_string(),
        match_reason: format!("Found via query: {}", query),
    })
}

/// Similarity of two strings, 0-100, on normalized text.
fn similarity(a: &str, b: &str) -> f32 {
    let na = normalize(a);
    let nb = normalize(b);
    (strsim::normalized_levenshtein(&na, &nb) * 100.0) as f32
}

/// Lowercase, strip punctuation, collapse whitespace.
fn normalize(s: &str) -> String {
    let lowered: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    items: Vec<SpotifyTrack>,
}

/// Track object as returned by /v1/search
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<SpotifyArtist>,
    pub album: SpotifyAlbum,
    pub duration_ms: Option<i64>,
    pub popularity: Option<i64>,
    pub external_urls: ExternalUrls,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
    pub release_date: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}
