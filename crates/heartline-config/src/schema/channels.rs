use serde::{Deserialize, Serialize};

/// Realtime topic names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Topic carrying the shared presence set.
    pub presence_topic: String,
    /// Topic carrying pulse broadcasts.
    pub pulse_topic: String,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            presence_topic: "heartbeat-room".into(),
            pulse_topic: "love_room".into(),
        }
    }
}
