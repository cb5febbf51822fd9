//! Services for the catalog sync pipeline

pub mod decision;
pub mod orchestrator;
pub mod search;
pub mod session_registry;
pub mod spotify;

pub use decision::{classify, Verdict};
pub use orchestrator::SyncOrchestrator;
pub use search::{SearchError, SearchOptions, TrackSearch};
pub use session_registry::{RegistryError, SessionRegistry};
pub use spotify::SpotifyClient;
