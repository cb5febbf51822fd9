//! Catalog song model

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A song in the local catalog, reconciled against Spotify by the sync
/// pipeline. Soft-deleted songs (`deleted_at` set) are never processed.
#[derive(Debug, Clone, Serialize)]
pub struct Song {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub spotify_url: Option<String>,
    pub duration_ms: Option<i64>,
    pub release_year: Option<i32>,
    pub cover_image_url: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Song {
    /// Create a new catalog song with no Spotify link.
    pub fn new(title: impl Into<String>, author: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author,
            spotify_url: None,
            duration_ms: None,
            release_year: None,
            cover_image_url: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The Spotify-derived fields projected onto a song, either by the
/// orchestrator (auto-apply) or by the review resolver (approve).
///
/// `author` and `cover_image_url` are optional: absent values leave the
/// song's existing fields untouched rather than clearing them.
#[derive(Debug, Clone)]
pub struct SpotifyLink {
    pub spotify_url: String,
    pub duration_ms: Option<i64>,
    pub release_year: Option<i32>,
    pub author: Option<String>,
    pub cover_image_url: Option<String>,
}

/// Parse the year out of a Spotify release date ("2003", "2003-05", or
/// "2003-05-14").
pub(crate) fn release_year_of(release_date: Option<&str>) -> Option<i32> {
    let date = release_date?;
    let year = date.split('-').next()?;
    year.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_year_parses_partial_dates() {
        assert_eq!(release_year_of(Some("1959-08-17")), Some(1959));
        assert_eq!(release_year_of(Some("1959-08")), Some(1959));
        assert_eq!(release_year_of(Some("1959")), Some(1959));
        assert_eq!(release_year_of(Some("unknown")), None);
        assert_eq!(release_year_of(None), None);
    }

    #[test]
    fn test_new_song_has_no_link() {
        let song = Song::new("Giant Steps", Some("John Coltrane".into()));
        assert!(song.spotify_url.is_none());
        assert!(song.deleted_at.is_none());
    }
}
