//! Timing configuration with per-mapping overrides.
//!
//! One global [`Config`] is shared by every mapping; each mapping carries a
//! [`MappingConfig`] whose set fields shadow the global values. Resolution is
//! override, then global, then the built-in default.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Inter-keystroke sleep used when neither the mapping nor the global config
/// sets one. Human-perceptible resolution, nothing finer is promised.
pub const DEFAULT_KEYSTROKE_SLEEP_MS: u64 = 10;

/// Global configuration, typically loaded from the surrounding system's
/// config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keystroke_sleep_ms: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn set_keystroke_sleep_ms(&mut self, ms: u64) {
        self.keystroke_sleep_ms = Some(ms);
    }

    pub fn keystroke_sleep_ms(&self) -> Option<u64> {
        self.keystroke_sleep_ms
    }
}

/// Per-mapping view of the configuration.
///
/// Cheap to clone; the global half is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    keystroke_sleep_ms: Option<u64>,
    global: Arc<Config>,
}

impl MappingConfig {
    pub fn new(global: Arc<Config>) -> Self {
        Self {
            keystroke_sleep_ms: None,
            global,
        }
    }

    /// Override the inter-keystroke sleep for this mapping only.
    pub fn set_keystroke_sleep_ms(&mut self, ms: u64) {
        self.keystroke_sleep_ms = Some(ms);
    }

    /// Resolved inter-keystroke sleep in milliseconds.
    pub fn keystroke_sleep_ms(&self) -> u64 {
        self.keystroke_sleep_ms
            .or(self.global.keystroke_sleep_ms())
            .unwrap_or(DEFAULT_KEYSTROKE_SLEEP_MS)
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self::new(Arc::new(Config::default()))
    }
}
