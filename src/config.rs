//! Engine configuration parsed from environment variables.
//!
//! Every knob has a `DEFAULT_*` constant; unset or unparsable variables fall
//! back to it, so `EngineConfig::from_env()` never fails.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

pub const DEFAULT_UNDO_HISTORY_LIMIT: i64 = 50;
pub const DEFAULT_ANIMATION_MS: u64 = 250;
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
pub const DEFAULT_BOUNDS_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_NEEDS_CLIENT_LAYOUT: bool = true;
pub const DEFAULT_NEEDS_SERVER_LAYOUT: bool = false;

/// Runtime knobs of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum undo entries; `None` keeps the whole history.
    pub undo_history_limit: Option<usize>,
    /// Duration of animated commands, in milliseconds.
    pub animation_ms: u64,
    /// Tick of the timer-driven frame syncer, in milliseconds.
    pub frame_interval_ms: u64,
    /// Upper bound for any request/response round trip, in milliseconds.
    pub bounds_timeout_ms: u64,
    /// Whether model submission measures the model in the hidden target first.
    pub needs_client_layout: bool,
    /// Whether the local model source runs its layout engine.
    pub needs_server_layout: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            undo_history_limit: history_limit(DEFAULT_UNDO_HISTORY_LIMIT),
            animation_ms: DEFAULT_ANIMATION_MS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            bounds_timeout_ms: DEFAULT_BOUNDS_TIMEOUT_MS,
            needs_client_layout: DEFAULT_NEEDS_CLIENT_LAYOUT,
            needs_server_layout: DEFAULT_NEEDS_SERVER_LAYOUT,
        }
    }
}

impl EngineConfig {
    /// Build the configuration from environment variables.
    ///
    /// Optional:
    /// - `DIAGRAM_UNDO_HISTORY_LIMIT`: default 50, `-1` for unlimited
    /// - `DIAGRAM_ANIMATION_MS`: default 250
    /// - `DIAGRAM_FRAME_INTERVAL_MS`: default 16
    /// - `DIAGRAM_BOUNDS_TIMEOUT_MS`: default 5000
    /// - `DIAGRAM_NEEDS_CLIENT_LAYOUT`: default `true`
    /// - `DIAGRAM_NEEDS_SERVER_LAYOUT`: default `false`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            undo_history_limit: history_limit(env_parse("DIAGRAM_UNDO_HISTORY_LIMIT", DEFAULT_UNDO_HISTORY_LIMIT)),
            animation_ms: env_parse("DIAGRAM_ANIMATION_MS", DEFAULT_ANIMATION_MS),
            frame_interval_ms: env_parse("DIAGRAM_FRAME_INTERVAL_MS", DEFAULT_FRAME_INTERVAL_MS).max(1),
            bounds_timeout_ms: env_parse("DIAGRAM_BOUNDS_TIMEOUT_MS", DEFAULT_BOUNDS_TIMEOUT_MS),
            needs_client_layout: env_parse("DIAGRAM_NEEDS_CLIENT_LAYOUT", DEFAULT_NEEDS_CLIENT_LAYOUT),
            needs_server_layout: env_parse("DIAGRAM_NEEDS_SERVER_LAYOUT", DEFAULT_NEEDS_SERVER_LAYOUT),
        }
    }

    #[must_use]
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.bounds_timeout_ms)
    }
}

/// Negative limits mean unlimited history.
fn history_limit(raw: i64) -> Option<usize> {
    usize::try_from(raw).map_or(None, Some)
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
