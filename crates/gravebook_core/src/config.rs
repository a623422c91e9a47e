//! Session configuration.
//!
//! # Responsibility
//! - Hold the knobs a session needs up front: backend base URL, snapshot
//!   file location, network timeouts.
//! - Read overrides from the environment without scattering `env::var`
//!   calls through the codebase.

use std::path::PathBuf;

const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const DEFAULT_SNAPSHOT_FILE: &str = "gravebook.sqlite3";
/// Bounds every backend call; geocoding must never hold up the session.
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Runtime configuration for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Backend base URL, e.g. `http://localhost:5000`.
    pub backend_url: String,
    /// Local snapshot file written by save-locally.
    pub snapshot_path: PathBuf,
    /// Default per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SessionConfig {
    /// Builds a config from defaults plus environment overrides:
    /// `GRAVEBOOK_BACKEND_URL`, `GRAVEBOOK_SNAPSHOT`,
    /// `GRAVEBOOK_TIMEOUT_MS`.
    ///
    /// An unparseable timeout falls back to the default rather than
    /// failing session start.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("GRAVEBOOK_BACKEND_URL") {
            if !url.trim().is_empty() {
                config.backend_url = url.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("GRAVEBOOK_SNAPSHOT") {
            if !path.trim().is_empty() {
                config.snapshot_path = PathBuf::from(path.trim());
            }
        }
        if let Ok(timeout) = std::env::var("GRAVEBOOK_TIMEOUT_MS") {
            if let Ok(parsed) = timeout.trim().parse::<u64>() {
                if parsed > 0 {
                    config.timeout_ms = parsed;
                }
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::SessionConfig;

    #[test]
    fn defaults_are_sane() {
        let config = SessionConfig::default();
        assert_eq!(config.backend_url, "http://localhost:5000");
        assert!(config.timeout_ms > 0);
    }
}
