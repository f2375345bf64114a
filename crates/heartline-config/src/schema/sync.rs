use serde::{Deserialize, Serialize};

/// What drives the partner's side of the sync state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteSignalKind {
    /// The partner's presence `is_active` flag.
    #[default]
    Presence,
    /// A received pulse keeps the partner active for `pulse_hold_ms`.
    Pulse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub remote_signal: RemoteSignalKind,
    pub pulse_hold_ms: u64,
    /// Vibration pattern (on/off milliseconds) played when sync is reached.
    pub haptic_pattern: Vec<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_signal: RemoteSignalKind::Presence,
            pulse_hold_ms: 2000,
            haptic_pattern: vec![100, 50, 100, 50, 200],
        }
    }
}
