//! Queued match awaiting reviewer judgment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::song::{release_year_of, SpotifyLink};
use super::TrackCandidate;

/// Review state of a queued match.
///
/// `pending --approve--> approved` and `pending --reject--> rejected`;
/// both resolved states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Approved,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Approved => "approved",
            MatchStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = solfa_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "approved" => Ok(MatchStatus::Approved),
            "rejected" => Ok(MatchStatus::Rejected),
            other => Err(solfa_common::Error::InvalidInput(format!(
                "Unknown match status: {}",
                other
            ))),
        }
    }
}

/// A persisted candidate awaiting (or having received) human judgment.
///
/// Snapshots every candidate field at creation time so approval can project
/// exactly what the reviewer saw, even if Spotify's result set has since
/// drifted. Created by the orchestrator; mutated only by the review
/// resolver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongMatch {
    pub id: Uuid,
    pub song_id: Uuid,
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub spotify_url: String,
    pub preview_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub duration_ms: Option<i64>,
    pub release_date: Option<String>,
    pub popularity: Option<i64>,
    pub confidence: f32,
    pub search_query: String,
    pub match_reason: String,
    pub status: MatchStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SongMatch {
    /// Snapshot a candidate as a new pending match for `song_id`.
    pub fn from_candidate(song_id: Uuid, candidate: &TrackCandidate) -> Self {
        Self {
            id: Uuid::new_v4(),
            song_id,
            track_id: candidate.track_id.clone(),
            track_name: candidate.track_name.clone(),
            artist_name: candidate.artist_name.clone(),
            album_name: candidate.album_name.clone(),
            spotify_url: candidate.spotify_url.clone(),
            preview_url: candidate.preview_url.clone(),
            cover_image_url: candidate.cover_image_url.clone(),
            duration_ms: candidate.duration_ms,
            release_date: candidate.release_date.clone(),
            popularity: candidate.popularity,
            confidence: candidate.confidence,
            search_query: candidate.search_query.clone(),
            match_reason: candidate.match_reason.clone(),
            status: MatchStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    /// The fields an approval writes onto the song, identical in shape to
    /// what auto-apply would have written.
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
    use std::str::FromStr;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            MatchStatus::Pending,
            MatchStatus::Approved,
            MatchStatus::Rejected,
        ] {
            assert_eq!(MatchStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(MatchStatus::from_str("resolved").is_err());
    }

    #[test]
    fn test_from_candidate_starts_pending() {
        let candidate = TrackCandidate {
            track_id: "t".into(),
            track_name: "Waltz for Debby".into(),
            artist_name: "Bill Evans".into(),
            album_name: "Waltz for Debby".into(),
            spotify_url: "https://open.spotify.com/track/t".into(),
            preview_url: None,
            cover_image_url: None,
            duration_ms: Some(1000),
            release_date: Some("1962".into()),
            popularity: None,
            confidence: 55.0,
            search_query: "q".into(),
            match_reason: "Strong title match".into(),
        };
        let m = SongMatch::from_candidate(Uuid::new_v4(), &candidate);
        assert_eq!(m.status, MatchStatus::Pending);
        assert!(m.reviewed_by.is_none());
        assert!(m.reviewed_at.is_none());
        assert_eq!(m.link().release_year, Some(1962));
    }
}
