//! Song database operations

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use solfa_common::Result;

use crate::models::{Song, SpotifyLink};

const SONG_COLUMNS: &str = "id, title, author, spotify_url, duration_ms, release_year, \
                            cover_image_url, deleted_at, created_at, updated_at";

/// Save a song to the database (insert or full update).
pub async fn save_song(pool: &SqlitePool, song: &Song) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO songs (
            id, title, author, spotify_url, duration_ms, release_year,
            cover_image_url, deleted_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            author = excluded.author,
            spotify_url = excluded.spotify_url,
            duration_ms = excluded.duration_ms,
            release_year = excluded.release_year,
            cover_image_url = excluded.cover_image_url,
            deleted_at = excluded.deleted_at,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(song.id.to_string())
    .bind(&song.title)
    .bind(&song.author)
    .bind(&song.spotify_url)
    .bind(song.duration_ms)
    .bind(song.release_year)
    .bind(&song.cover_image_url)
    .bind(song.deleted_at.map(|dt| dt.to_rfc3339()))
    .bind(song.created_at.to_rfc3339())
    .bind(song.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a song by id.
pub async fn get_song(pool: &SqlitePool, song_id: Uuid) -> Result<Option<Song>> {
    let sql = format!("SELECT {} FROM songs WHERE id = ?", SONG_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(song_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(song_from_row).transpose()
}

/// Resolve the candidate set for a sync run.
///
/// An explicit non-empty `song_ids` selection wins; otherwise all
/// non-deleted songs missing a Spotify link are returned, or every
/// non-deleted song when `force` is set. Order is stable (creation order)
/// so progress events track the catalog order operators see.
pub async fn list_sync_candidates(
    pool: &SqlitePool,
    song_ids: Option<&[Uuid]>,
    force: bool,
) -> Result<Vec<Song>> {
    let rows = match song_ids {
        Some(ids) if !ids.is_empty() => {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "SELECT {} FROM songs WHERE deleted_at IS NULL AND id IN ({}) \
                 ORDER BY created_at, id",
                SONG_COLUMNS, placeholders
            );
            let mut query = sqlx::query(&sql);
            for id in ids {
                query = query.bind(id.to_string());
            }
            query.fetch_all(pool).await?
        }
        _ if force => {
            let sql = format!(
                "SELECT {} FROM songs WHERE deleted_at IS NULL ORDER BY created_at, id",
                SONG_COLUMNS
            );
            sqlx::query(&sql).fetch_all(pool).await?
        }
        _ => {
            let sql = format!(
                "SELECT {} FROM songs WHERE deleted_at IS NULL AND spotify_url IS NULL \
                 ORDER BY created_at, id",
                SONG_COLUMNS
            );
            sqlx::query(&sql).fetch_all(pool).await?
        }
    };

    rows.iter().map(song_from_row).collect()
}

/// Write Spotify link fields onto a song.
///
/// Absent `author`/`cover_image_url` values leave the existing columns
/// untouched. Usable inside a transaction (approve) or directly against the
/// pool (auto-apply).
pub async fn apply_link<'e, E>(executor: E, song_id: Uuid, link: &SpotifyLink) -> Result<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE songs SET
            spotify_url = ?,
            duration_ms = ?,
            release_year = ?,
            author = COALESCE(?, author),
            cover_image_url = COALESCE(?, cover_image_url),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&link.spotify_url)
    .bind(link.duration_ms)
    .bind(link.release_year)
    .bind(&link.author)
    .bind(&link.cover_image_url)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(song_id.to_string())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(solfa_common::Error::NotFound(format!(
            "Song not found: {}",
            song_id
        )));
    }

    Ok(())
}

fn song_from_row(row: &SqliteRow) -> Result<Song> {
    let id: String = row.get("id");
    let deleted_at: Option<String> = row.get("deleted_at");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Song {
        id: super::parse_uuid(&id, "songs.id")?,
        title: row.get("title"),
        author: row.get("author"),
        spotify_url: row.get("spotify_url"),
        duration_ms: row.get("duration_ms"),
        release_year: row.get("release_year"),
        cover_image_url: row.get("cover_image_url"),
        deleted_at: deleted_at
            .map(|s| super::parse_datetime(&s, "songs.deleted_at"))
            .transpose()?,
        created_at: super::parse_datetime(&created_at, "songs.created_at")?,
        updated_at: super::parse_datetime(&updated_at, "songs.updated_at")?,
    })
}
