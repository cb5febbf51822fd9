//! API handlers for solfa-sync

pub mod auth;
pub mod health;
pub mod matches;
pub mod sync;

pub use health::health_routes;
pub use matches::match_routes;
pub use sync::sync_routes;
