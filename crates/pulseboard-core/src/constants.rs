//! Application-wide constants
//!
//! Poll cadence, persistence keys, and the defaults used when the worker
//! or local storage has nothing to offer.

use std::time::Duration;

/// Default interval for both always-on pollers (tasks, heartbeat)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

pub const fn default_poll_interval() -> Duration {
    Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
}

/// Persistence keys used with the [`crate::store::KeyValueStore`] hook
pub mod keys {
    pub const THEME: &str = "theme";
    pub const ASSISTANT_PROFILE: &str = "assistant_profile";
}

// Assistant profile defaults
pub const DEFAULT_ASSISTANT_NAME: &str = "Nova";
pub const DEFAULT_ASSISTANT_INITIALS: &str = "N";
pub const DEFAULT_ASSISTANT_DESCRIPTION: &str = "AI Assistant";
pub const DEFAULT_ASSISTANT_COLOR: &str = "#3b82f6";

/// Heartbeat check-in interval (minutes) assumed when the agent never reported one
pub const DEFAULT_HEARTBEAT_INTERVAL_MINUTES: u32 = 60;

/// Check-in intervals offered by the heartbeat interval editor (minutes)
pub const HEARTBEAT_INTERVAL_CHOICES: [u32; 5] = [15, 30, 60, 120, 360];

/// Completed one-off tasks shown on the task board
pub const COMPLETED_TASKS_SHOWN: usize = 20;

/// Environment variables that override the config file
pub mod env {
    pub const WORKER_URL: &str = "PULSEBOARD_WORKER_URL";
    pub const API_KEY: &str = "PULSEBOARD_API_KEY";
    pub const DATA_DIR: &str = "PULSEBOARD_DATA_DIR";
    pub const LOG_FILE: &str = "PULSEBOARD_LOG_FILE";
    pub const LOG_FILTER: &str = "PULSEBOARD_LOG";
}
