//! Configuration for solfa-sync
//!
//! Two-tier resolution with environment variables over the TOML file
//! (`solfa-sync.toml` by default, or the path in `SOLFA_SYNC_CONFIG`).
//! Spotify credentials are required; everything else has a default.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

use solfa_common::{Error, Result};

const DEFAULT_PORT: u16 = 5731;
const DEFAULT_DATABASE_PATH: &str = "solfa.db";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RATE_LIMIT_MS: u64 = 250;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub port: u16,
    pub database_path: PathBuf,
    pub spotify: SpotifyConfig,
}

/// Spotify client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Per-request timeout; a hung lookup degrades to a per-song failure
    /// instead of stalling the session.
    pub request_timeout_secs: u64,
    /// Minimum interval between catalog requests.
    pub rate_limit_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            spotify: SpotifyConfig::default(),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
        }
    }
}

impl SyncConfig {
    /// Load configuration: TOML file, then environment overrides, then
    /// validation.
    pub fn load() -> Result<Self> {
        let path = std::env::var("SOLFA_SYNC_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("solfa-sync.toml"));

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var("SOLFA_SYNC_PORT") {
            match raw.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring invalid SOLFA_SYNC_PORT: {}", raw),
            }
        }
        if let Ok(path) = std::env::var("SOLFA_SYNC_DATABASE") {
            self.database_path = PathBuf::from(path);
        }
        if let Ok(id) = std::env::var("SOLFA_SPOTIFY_CLIENT_ID") {
            self.spotify.client_id = id;
        }
        if let Ok(secret) = std::env::var("SOLFA_SPOTIFY_CLIENT_SECRET") {
            self.spotify.client_secret = secret;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.spotify.client_id.trim().is_empty() || self.spotify.client_secret.trim().is_empty()
        {
            return Err(Error::Config(
                "Spotify credentials not configured. Set them using one of:\n\
                 1. Environment: SOLFA_SPOTIFY_CLIENT_ID / SOLFA_SPOTIFY_CLIENT_SECRET\n\
                 2. TOML config: solfa-sync.toml ([spotify] client_id, client_secret)\n\
                 \n\
                 Obtain credentials at: https://developer.spotify.com/dashboard"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
