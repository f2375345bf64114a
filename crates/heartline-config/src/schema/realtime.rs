//! Realtime server connection settings.

use serde::{Deserialize, Serialize};

/// Supabase Realtime connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Supabase project reference (the `<ref>` in `<ref>.supabase.co`).
    pub project_ref: String,
    /// Supabase anon key (publishable).
    pub api_key: String,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval: u64,
    /// Reconnect base delay in seconds.
    pub reconnect_delay: u64,
    /// Maximum reconnect delay in seconds.
    pub max_reconnect_delay: u64,
}

impl std::fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("project_ref", &self.project_ref)
            .field("api_key", &"[REDACTED]")
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("max_reconnect_delay", &self.max_reconnect_delay)
            .finish()
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            project_ref: String::new(),
            api_key: String::new(),
            heartbeat_interval: 25,
            reconnect_delay: 1,
            max_reconnect_delay: 30,
        }
    }
}

impl RealtimeConfig {
    /// True when both the project reference and key are filled in.
    pub fn is_configured(&self) -> bool {
        !self.project_ref.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}
