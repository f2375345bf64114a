//! Incoming Phoenix frame decoding.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::types::{PhoenixMessage, PresenceMap, RealtimeEvent};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the short topic name from a Phoenix topic (strip "realtime:" prefix).
fn strip_topic_prefix(topic: &str) -> &str {
    topic.strip_prefix("realtime:").unwrap_or(topic)
}

/// Parse a Phoenix presence map into `HashMap<key, Vec<meta>>`.
///
/// Supabase sends presence as `{ "key": { "metas": [{ ... }] } }`.
pub(crate) fn parse_presence_map(value: &serde_json::Value) -> PresenceMap {
    let mut result = HashMap::new();
    if let Some(obj) = value.as_object() {
        for (key, val) in obj {
            if let Some(metas) = val.get("metas").and_then(|m| m.as_array()) {
                result.insert(key.clone(), metas.clone());
            }
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Message Handler
// ---------------------------------------------------------------------------

/// Translate one server frame into a transport event.
///
/// `join_topic` is `Some(topic)` when the frame's ref answers a pending
/// `phx_join`; other replies (heartbeats, broadcast acks) produce nothing
/// unless they report an error.
pub(crate) fn decode_frame(msg: &PhoenixMessage, join_topic: Option<&str>) -> Option<RealtimeEvent> {
    let topic = strip_topic_prefix(&msg.topic);

    match msg.event.as_str() {
        "phx_reply" => {
            let status = msg.payload.get("status").and_then(|s| s.as_str())?;
            if status == "ok" {
                let joined = join_topic?;
                debug!(topic = %joined, "Channel join acknowledged");
                return Some(RealtimeEvent::ChannelJoined {
                    topic: joined.to_string(),
                });
            }
            let message = msg
                .payload
                .get("response")
                .and_then(|r| r.get("reason"))
                .and_then(|r| r.as_str())
                .unwrap_or("unknown error")
                .to_string();
            warn!(topic = %topic, status = %status, "Channel reply error");
            Some(RealtimeEvent::ChannelError {
                topic: topic.to_string(),
                message,
            })
        }
        "phx_error" => {
            warn!(topic = %topic, "Channel error");
            Some(RealtimeEvent::ChannelError {
                topic: topic.to_string(),
                message: "Channel error".to_string(),
            })
        }
        "phx_close" => {
            info!(topic = %topic, "Channel closed");
            Some(RealtimeEvent::ChannelError {
                topic: topic.to_string(),
                message: "Channel closed".to_string(),
            })
        }
        "broadcast" => {
            let inner_event = msg
                .payload
                .get("event")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown")
                .to_string();
            let inner_payload = msg
                .payload
                .get("payload")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            debug!(topic = %topic, event = %inner_event, "Broadcast received");
            Some(RealtimeEvent::Broadcast {
                topic: topic.to_string(),
                event: inner_event,
                payload: inner_payload,
            })
        }
        "presence_state" => {
            let state = parse_presence_map(&msg.payload);
            debug!(topic = %topic, keys = state.len(), "Presence state received");
            Some(RealtimeEvent::PresenceState {
                topic: topic.to_string(),
                state,
            })
        }
        "presence_diff" => {
            let joins = msg
                .payload
                .get("joins")
                .map(parse_presence_map)
                .unwrap_or_default();
            let leaves = msg
                .payload
                .get("leaves")
                .map(parse_presence_map)
                .unwrap_or_default();
            debug!(
                topic = %topic,
                joins = joins.len(),
                leaves = leaves.len(),
                "Presence diff received"
            );
            Some(RealtimeEvent::PresenceDiff {
                topic: topic.to_string(),
                joins,
                leaves,
            })
        }
        _ => {
            debug!(topic = %topic, event = %msg.event, "Unhandled Phoenix event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(topic: &str, event: &str, payload: serde_json::Value) -> PhoenixMessage {
        PhoenixMessage {
            topic: topic.into(),
            event: event.into(),
            payload,
            msg_ref: Some("3".into()),
        }
    }

    #[test]
    fn heartbeat_reply_is_silent() {
        let msg = frame("phoenix", "phx_reply", serde_json::json!({ "status": "ok", "response": {} }));
        assert!(decode_frame(&msg, None).is_none());
    }

    #[test]
    fn join_reply_reports_joined_topic() {
        let msg = frame(
            "realtime:heartbeat-room",
            "phx_reply",
            serde_json::json!({ "status": "ok", "response": {} }),
        );
        let event = decode_frame(&msg, Some("heartbeat-room"));
        assert!(matches!(event, Some(RealtimeEvent::ChannelJoined { ref topic }) if topic == "heartbeat-room"));
    }

    #[test]
    fn error_reply_carries_reason() {
        let msg = frame(
            "realtime:love_room",
            "phx_reply",
            serde_json::json!({ "status": "error", "response": { "reason": "unauthorized" } }),
        );
        match decode_frame(&msg, None) {
            Some(RealtimeEvent::ChannelError { topic, message }) => {
                assert_eq!(topic, "love_room");
                assert_eq!(message, "unauthorized");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn broadcast_unwraps_inner_event() {
        let msg = frame(
            "realtime:love_room",
            "broadcast",
            serde_json::json!({
                "type": "broadcast",
                "event": "pulse",
                "payload": { "type": "pulse", "from": "B" }
            }),
        );
        match decode_frame(&msg, None) {
            Some(RealtimeEvent::Broadcast { topic, event, payload }) => {
                assert_eq!(topic, "love_room");
                assert_eq!(event, "pulse");
                assert_eq!(payload["from"], "B");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn presence_diff_parses_joins_and_leaves() {
        let msg = frame(
            "realtime:heartbeat-room",
            "presence_diff",
            serde_json::json!({
                "joins": { "user_a": { "metas": [{ "role": "A", "is_active": true }] } },
                "leaves": { "user_b": { "metas": [{ "role": "B", "is_active": false }] } }
            }),
        );
        match decode_frame(&msg, None) {
            Some(RealtimeEvent::PresenceDiff { joins, leaves, .. }) => {
                assert_eq!(joins["user_a"][0]["is_active"], true);
                assert!(leaves.contains_key("user_b"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn presence_map_skips_entries_without_metas() {
        let map = parse_presence_map(&serde_json::json!({
            "good": { "metas": [{}] },
            "bad": { "nope": 1 }
        }));
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("good"));
    }
}
