//! Configuration, protocol types, and event/command enums for the realtime client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to Supabase Realtime.
#[derive(Clone)]
pub struct RealtimeConfig {
    /// Supabase project reference.
    pub project_ref: String,
    /// Supabase anon key (publishable).
    pub api_key: String,
    /// Heartbeat interval in seconds (default: 25).
    pub heartbeat_interval_secs: u64,
    /// Reconnect base delay in seconds.
    pub reconnect_delay_secs: u64,
    /// Maximum reconnect delay in seconds.
    pub max_reconnect_delay_secs: u64,
}

impl std::fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("project_ref", &self.project_ref)
            .field("api_key", &"[REDACTED]")
            .field("heartbeat_interval_secs", &self.heartbeat_interval_secs)
            .field("reconnect_delay_secs", &self.reconnect_delay_secs)
            .field("max_reconnect_delay_secs", &self.max_reconnect_delay_secs)
            .finish()
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            project_ref: String::new(),
            api_key: String::new(),
            heartbeat_interval_secs: 25,
            reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 30,
        }
    }
}

impl RealtimeConfig {
    /// Build the WebSocket URL for Supabase Realtime.
    pub(crate) fn ws_url(&self) -> String {
        format!(
            "wss://{}.supabase.co/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.project_ref, self.api_key
        )
    }

    /// Next backoff delay after a failed or dropped connection.
    pub(crate) fn next_delay(&self, current: u64) -> u64 {
        current.saturating_mul(2).clamp(1, self.max_reconnect_delay_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// Phoenix Protocol Types
// ---------------------------------------------------------------------------

/// A Phoenix protocol message envelope (v1 JSON format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    pub payload: serde_json::Value,
    #[serde(rename = "ref")]
    pub msg_ref: Option<String>,
}

impl PhoenixMessage {
    /// Build an outgoing message on `realtime:<topic>`.
    pub(crate) fn on_topic(topic: &str, event: &str, payload: serde_json::Value, msg_ref: String) -> Self {
        Self {
            topic: format!("realtime:{topic}"),
            event: event.to_string(),
            payload,
            msg_ref: Some(msg_ref),
        }
    }
}

// ---------------------------------------------------------------------------
// Channel Configuration
// ---------------------------------------------------------------------------

/// Configuration for a Supabase Realtime channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub broadcast: BroadcastConfig,
    pub presence: PresenceKey,
}

/// Broadcast configuration for a channel.
#[derive(Debug, Clone, Default)]
pub struct BroadcastConfig {
    /// Whether to receive your own broadcasts (Supabase "self" key).
    pub self_send: bool,
    /// Whether broadcasts are acknowledged by the server.
    pub ack: bool,
}

/// The key this client is listed under in the channel's presence set.
#[derive(Debug, Clone, Default)]
pub struct PresenceKey {
    pub key: String,
}

impl ChannelConfig {
    /// Presence channel keyed by `key`; broadcasts are not used.
    pub fn presence(key: &str) -> Self {
        Self {
            broadcast: BroadcastConfig::default(),
            presence: PresenceKey {
                key: key.to_string(),
            },
        }
    }

    /// Broadcast-only channel. Own messages are not echoed and not acked.
    pub fn broadcast_only() -> Self {
        Self {
            broadcast: BroadcastConfig::default(),
            presence: PresenceKey::default(),
        }
    }

    /// Serialize to the JSON payload expected by Supabase phx_join.
    pub(crate) fn to_join_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "config": {
                "broadcast": {
                    "self": self.broadcast.self_send,
                    "ack": self.broadcast.ack
                },
                "presence": {
                    "key": self.presence.key
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Events & Commands
// ---------------------------------------------------------------------------

/// Raw presence map: presence key -> list of metas tracked under it.
pub type PresenceMap = HashMap<String, Vec<serde_json::Value>>;

/// Events emitted by a realtime transport.
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    /// Connection established.
    Connected,
    /// Connection lost.
    Disconnected,
    /// Successfully joined a channel.
    ChannelJoined { topic: String },
    /// Channel closed or errored.
    ChannelError { topic: String, message: String },
    /// A broadcast event received on a channel.
    Broadcast {
        topic: String,
        event: String,
        payload: serde_json::Value,
    },
    /// Full presence state snapshot (received after joining).
    PresenceState { topic: String, state: PresenceMap },
    /// Incremental presence changes.
    PresenceDiff {
        topic: String,
        joins: PresenceMap,
        leaves: PresenceMap,
    },
    /// Transport-level error.
    Error(String),
}

/// Commands sent to the connection task from the application layer.
#[derive(Debug)]
pub(crate) enum RealtimeCommand {
    JoinChannel {
        topic: String,
        config: ChannelConfig,
    },
    LeaveChannel {
        topic: String,
    },
    Broadcast {
        topic: String,
        event: String,
        payload: serde_json::Value,
    },
    PresenceTrack {
        topic: String,
        payload: serde_json::Value,
    },
    PresenceUntrack {
        topic: String,
    },
    Disconnect,
}

impl RealtimeCommand {
    /// The Phoenix frame this command puts on the wire.
    pub(crate) fn to_frame(&self, msg_ref: String) -> Option<PhoenixMessage> {
        let msg = match self {
            RealtimeCommand::JoinChannel { topic, config } => {
                PhoenixMessage::on_topic(topic, "phx_join", config.to_join_payload(), msg_ref)
            }
            RealtimeCommand::LeaveChannel { topic } => {
                PhoenixMessage::on_topic(topic, "phx_leave", serde_json::json!({}), msg_ref)
            }
            RealtimeCommand::Broadcast {
                topic,
                event,
                payload,
            } => PhoenixMessage::on_topic(
                topic,
                "broadcast",
                serde_json::json!({
                    "type": "broadcast",
                    "event": event,
                    "payload": payload
                }),
                msg_ref,
            ),
            RealtimeCommand::PresenceTrack { topic, payload } => PhoenixMessage::on_topic(
                topic,
                "presence",
                serde_json::json!({
                    "type": "presence",
                    "event": "track",
                    "payload": payload
                }),
                msg_ref,
            ),
            RealtimeCommand::PresenceUntrack { topic } => PhoenixMessage::on_topic(
                topic,
                "presence",
                serde_json::json!({
                    "type": "presence",
                    "event": "untrack"
                }),
                msg_ref,
            ),
            RealtimeCommand::Disconnect => return None,
        };
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let config = RealtimeConfig {
            project_ref: "abcd".into(),
            api_key: "secret-anon-key".into(),
            ..Default::default()
        };
        let dbg = format!("{config:?}");
        assert!(dbg.contains("abcd"));
        assert!(!dbg.contains("secret-anon-key"));
    }

    #[test]
    fn ws_url_includes_project_and_version() {
        let config = RealtimeConfig {
            project_ref: "abcd".into(),
            api_key: "k".into(),
            ..Default::default()
        };
        assert_eq!(
            config.ws_url(),
            "wss://abcd.supabase.co/realtime/v1/websocket?apikey=k&vsn=1.0.0"
        );
    }

    #[test]
    fn backoff_doubles_up_to_max() {
        let config = RealtimeConfig::default();
        assert_eq!(config.next_delay(1), 2);
        assert_eq!(config.next_delay(16), 30);
        assert_eq!(config.next_delay(30), 30);
    }

    #[test]
    fn presence_join_payload_carries_key() {
        let payload = ChannelConfig::presence("user_1").to_join_payload();
        assert_eq!(payload["config"]["presence"]["key"], "user_1");
        assert_eq!(payload["config"]["broadcast"]["self"], false);
    }

    #[test]
    fn track_frame_wraps_payload() {
        let cmd = RealtimeCommand::PresenceTrack {
            topic: "heartbeat-room".into(),
            payload: serde_json::json!({ "is_active": true }),
        };
        let frame = cmd.to_frame("7".into()).unwrap();
        assert_eq!(frame.topic, "realtime:heartbeat-room");
        assert_eq!(frame.event, "presence");
        assert_eq!(frame.payload["event"], "track");
        assert_eq!(frame.payload["payload"]["is_active"], true);
        assert_eq!(frame.msg_ref.as_deref(), Some("7"));
    }

    #[test]
    fn broadcast_frame_nests_event() {
        let cmd = RealtimeCommand::Broadcast {
            topic: "love_room".into(),
            event: "pulse".into(),
            payload: serde_json::json!({ "type": "pulse", "from": "A" }),
        };
        let frame = cmd.to_frame("1".into()).unwrap();
        assert_eq!(frame.event, "broadcast");
        assert_eq!(frame.payload["event"], "pulse");
        assert_eq!(frame.payload["payload"]["from"], "A");
    }

    #[test]
    fn disconnect_has_no_frame() {
        assert!(RealtimeCommand::Disconnect.to_frame("1".into()).is_none());
    }
}
