//! Database access for solfa-sync
//!
//! SQLite via sqlx. Uuids and timestamps are stored as TEXT (uuid string /
//! RFC 3339); the "one pending match per song" invariant lives in the
//! schema itself as a partial unique index, so queuing is race-free across
//! concurrent sync sessions.

pub mod matches;
pub mod songs;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::Path;
use uuid::Uuid;

/// Initialize database connection pool, creating the file and tables as
/// needed.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the sync service's tables if they don't exist.
///
/// Idempotent; also used by tests against in-memory pools.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT,
            spotify_url TEXT,
            duration_ms INTEGER,
            release_year INTEGER,
            cover_image_url TEXT,
            deleted_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_matches (
            id TEXT PRIMARY KEY,
            song_id TEXT NOT NULL REFERENCES songs(id),
            track_id TEXT NOT NULL,
            track_name TEXT NOT NULL,
            artist_name TEXT NOT NULL,
            album_name TEXT NOT NULL,
            spotify_url TEXT NOT NULL,
            preview_url TEXT,
            cover_image_url TEXT,
            duration_ms INTEGER,
            release_date TEXT,
            popularity INTEGER,
            confidence REAL NOT NULL,
            search_query TEXT NOT NULL,
            match_reason TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            reviewed_by TEXT,
            reviewed_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one pending match per song, enforced by the store so that
    // concurrent sessions cannot double-queue the same song.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_song_matches_one_pending
        ON song_matches(song_id) WHERE status = 'pending'
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (songs, song_matches)");

    Ok(())
}

pub(crate) fn parse_uuid(value: &str, field: &str) -> solfa_common::Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| solfa_common::Error::Internal(format!("Invalid uuid in {}: {}", field, e)))
}

pub(crate) fn parse_datetime(value: &str, field: &str) -> solfa_common::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| solfa_common::Error::Internal(format!("Invalid timestamp in {}: {}", field, e)))
}
