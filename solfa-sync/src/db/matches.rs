//! Review match database operations

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use solfa_common::Result;

use crate::models::{MatchStatus, SongMatch};

const MATCH_COLUMNS: &str = "id, song_id, track_id, track_name, artist_name, album_name, \
                             spotify_url, preview_url, cover_image_url, duration_ms, \
                             release_date, popularity, confidence, search_query, match_reason, \
                             status, reviewed_by, reviewed_at, created_at";

/// Queue a pending match.
///
/// Returns `true` if the row was inserted, `false` if the song already has a
/// pending match (the partial unique index absorbed the insert). This is the
/// whole idempotency story: no separate existence check, so two sessions
/// racing on the same song cannot both queue it.
pub async fn queue_match(pool: &SqlitePool, song_match: &SongMatch) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO song_matches (
            id, song_id, track_id, track_name, artist_name, album_name,
            spotify_url, preview_url, cover_image_url, duration_ms,
            release_date, popularity, confidence, search_query, match_reason,
            status, reviewed_by, reviewed_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(song_match.id.to_string())
    .bind(song_match.song_id.to_string())
    .bind(&song_match.track_id)
    .bind(&song_match.track_name)
    .bind(&song_match.artist_name)
    .bind(&song_match.album_name)
    .bind(&song_match.spotify_url)
    .bind(&song_match.preview_url)
    .bind(&song_match.cover_image_url)
    .bind(song_match.duration_ms)
    .bind(&song_match.release_date)
    .bind(song_match.popularity)
    .bind(song_match.confidence)
    .bind(&song_match.search_query)
    .bind(&song_match.match_reason)
    .bind(song_match.status.as_str())
    .bind(song_match.reviewed_by.map(|id| id.to_string()))
    .bind(song_match.reviewed_at.map(|dt| dt.to_rfc3339()))
    .bind(song_match.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Load a match by id.
pub async fn load_match(pool: &SqlitePool, match_id: Uuid) -> Result<Option<SongMatch>> {
    let sql = format!("SELECT {} FROM song_matches WHERE id = ?", MATCH_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(match_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(match_from_row).transpose()
}

/// List matches, optionally filtered by status, newest first.
pub async fn list_matches(
    pool: &SqlitePool,
    status: Option<MatchStatus>,
) -> Result<Vec<SongMatch>> {
    let rows = match status {
        Some(status) => {
            let sql = format!(
                "SELECT {} FROM song_matches WHERE status = ? ORDER BY created_at DESC, id",
                MATCH_COLUMNS
            );
            sqlx::query(&sql)
                .bind(status.as_str())
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {} FROM song_matches ORDER BY created_at DESC, id",
                MATCH_COLUMNS
            );
            sqlx::query(&sql).fetch_all(pool).await?
        }
    };

    rows.iter().map(match_from_row).collect()
}

/// Transition a pending match to `approved` or `rejected`.
///
/// Returns `true` if the transition happened. The `status = 'pending'` guard
/// makes the transition one-way even under racing reviewers: the loser's
/// update matches zero rows.
pub async fn mark_resolved<'e, E>(
    executor: E,
    match_id: Uuid,
    status: MatchStatus,
    reviewer: Uuid,
    reviewed_at: DateTime<Utc>,
) -> Result<bool>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE song_matches
        SET status = ?, reviewed_by = ?, reviewed_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(status.as_str())
    .bind(reviewer.to_string())
    .bind(reviewed_at.to_rfc3339())
    .bind(match_id.to_string())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

fn match_from_row(row: &SqliteRow) -> Result<SongMatch> {
    let id: String = row.get("id");
    let song_id: String = row.get("song_id");
    let status: String = row.get("status");
    let reviewed_by: Option<String> = row.get("reviewed_by");
    let reviewed_at: Option<String> = row.get("reviewed_at");
    let created_at: String = row.get("created_at");

    Ok(SongMatch {
        id: super::parse_uuid(&id, "song_matches.id")?,
        song_id: super::parse_uuid(&song_id, "song_matches.song_id")?,
        track_id: row.get("track_id"),
        track_name: row.get("track_name"),
        artist_name: row.get("artist_name"),
        album_name: row.get("album_name"),
        spotify_url: row.get("spotify_url"),
        preview_url: row.get("preview_url"),
        cover_image_url: row.get("cover_image_url"),
        duration_ms: row.get("duration_ms"),
        release_date: row.get("release_date"),
        popularity: row.get("popularity"),
        confidence: row.get("confidence"),
        search_query: row.get("search_query"),
        match_reason: row.get("match_reason"),
        status: status.parse()?,
        reviewed_by: reviewed_by
            .map(|s| super::parse_uuid(&s, "song_matches.reviewed_by"))
            .transpose()?,
        reviewed_at: reviewed_at
            .map(|s| super::parse_datetime(&s, "song_matches.reviewed_at"))
            .transpose()?,
        created_at: super::parse_datetime(&created_at, "song_matches.created_at")?,
    })
}
