//! Active sync session registry
//!
//! Process-wide table of in-flight sync sessions, keyed by sync id. Holds
//! one cancellation token per session so the cancel endpoint can signal a
//! running orchestrator it shares no other state with. Owned by the app
//! state and injected where needed, so tests construct isolated registries.
//!
//! Lifecycle invariant: `release` runs exactly once per session, on every
//! terminal path. The registry has no other eviction, so a leaked entry
//! would both grow the map forever and let `cancel` report success for a
//! sync that no longer exists.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A session with this id is already registered
    #[error("Sync session already active: {0}")]
    DuplicateSession(String),
}

/// Shared table of active sync sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, CancellationToken>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and hand back its cancellation token.
    pub async fn register(&self, sync_id: &str) -> Result<CancellationToken, RegistryError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(sync_id) {
            return Err(RegistryError::DuplicateSession(sync_id.to_string()));
        }
        let token = CancellationToken::new();
        sessions.insert(sync_id.to_string(), token.clone());
        Ok(token)
    }

    /// Signal a session's token. Returns whether a live session was found.
    ///
    /// Signalling is idempotent; cancelling an already-cancelled session is
    /// a no-op that still reports `true` while the session is live.
    pub async fn cancel(&self, sync_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(sync_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove a session unconditionally.
    pub async fn release(&self, sync_id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(sync_id).is_none() {
            tracing::debug!(sync_id = %sync_id, "Release of unknown sync session");
        }
    }

    /// Whether a session is currently registered.
    pub async fn contains(&self, sync_id: &str) -> bool {
        self.sessions.read().await.contains_key(sync_id)
    }

    /// Number of active sessions.
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
