//! Domain models for the catalog sync service

mod candidate;
mod review;
mod song;
mod sync;

pub use candidate::TrackCandidate;
pub use review::{MatchStatus, SongMatch};
pub use song::{Song, SpotifyLink};
pub use sync::SyncOptions;
