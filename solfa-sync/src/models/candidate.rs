//! Candidate track returned by the external search capability

use serde::{Deserialize, Serialize};

use super::song::{release_year_of, SpotifyLink};

/// One proposed Spotify match for a catalog song.
///
/// Ephemeral: lives for a single pipeline iteration, then is discarded
/// (skip), snapshotted into a `SongMatch` (queue for review), or projected
/// onto the song (auto-apply).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCandidate {
    /// Spotify track id
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub spotify_url: String,
    pub preview_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub duration_ms: Option<i64>,
    /// Partial date string as Spotify reports it ("1959", "1959-08-17")
    pub release_date: Option<String>,
    pub popularity: Option<i64>,
    /// Match confidence, 0-100
    pub confidence: f32,
    /// The query string that produced this candidate
    pub search_query: String,
    /// Human-readable explanation of the score
    pub match_reason: String,
}

impl TrackCandidate {
    /// The fields an auto-apply writes onto the song.
    pub fn link(&self) -> SpotifyLink {
        SpotifyLink {
            spotify_url: self.spotify_url.clone(),
            duration_ms: self.duration_ms,
            release_year: release_year_of(self.release_date.as_deref()),
            author: Some(self.artist_name.clone()).filter(|a| !a.is_empty()),
            cover_image_url: self.cover_image_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> TrackCandidate {
        TrackCandidate {
            track_id: "4vLYewWIvqHfKtJDk8c8tq".into(),
            track_name: "Take Five".into(),
            artist_name: "The Dave Brubeck Quartet".into(),
            album_name: "Time Out".into(),
            spotify_url: "https://open.spotify.com/track/4vLYewWIvqHfKtJDk8c8tq".into(),
            preview_url: None,
            cover_image_url: Some("https://i.scdn.co/image/abc".into()),
            duration_ms: Some(324_000),
            release_date: Some("1959-12-14".into()),
            popularity: Some(71),
            confidence: 93.0,
            search_query: "track:\"Take Five\" artist:\"Dave Brubeck\"".into(),
            match_reason: "Exact title and artist match".into(),
        }
    }

    #[test]
    fn test_link_projects_release_year() {
        let link = candidate().link();
        assert_eq!(link.release_year, Some(1959));
        assert_eq!(link.author.as_deref(), Some("The Dave Brubeck Quartet"));
        assert_eq!(link.duration_ms, Some(324_000));
    }

    #[test]
    fn test_link_omits_empty_artist() {
        let mut c = candidate();
        c.artist_name = String::new();
        assert!(c.link().author.is_none());
    }
}
