//! Application payloads carried over the realtime transport.
//!
//! Everything arriving from the network passes through
//! [`SyncMessage::decode`] before it reaches the presence tracker or the
//! session state machine. Payloads that do not validate are rejected
//! here with a `ProtocolError`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use heartline_common::{ParticipantId, ProtocolError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::realtime::{PresenceMap, RealtimeEvent};
use crate::role::Role;

/// Broadcast event names.
pub mod events {
    pub const PULSE: &str = "pulse";
}

/// Longest pulse message accepted off the wire, in characters.
pub const MAX_MESSAGE_CHARS: usize = 280;

/// Payload each client tracks in the presence set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceMeta {
    pub role: Role,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_at: Option<DateTime<Utc>>,
}

impl PresenceMeta {
    pub fn new(role: Role, is_active: bool) -> Self {
        Self {
            role,
            is_active,
            online_at: Some(Utc::now()),
        }
    }
}

/// Broadcast payloads, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BroadcastPayload {
    Pulse {
        from: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emitted_at: Option<DateTime<Utc>>,
    },
}

/// A momentary "thinking of you" signal. Never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseEvent {
    pub sender_role: Role,
    pub emitted_at: DateTime<Utc>,
    pub payload: Option<String>,
    pub id: Option<String>,
}

impl PulseEvent {
    pub fn new(sender_role: Role, payload: Option<String>) -> Self {
        Self {
            sender_role,
            emitted_at: Utc::now(),
            payload,
            id: Some(heartline_common::new_pulse_id()),
        }
    }

    pub fn to_payload(&self) -> BroadcastPayload {
        BroadcastPayload::Pulse {
            from: self.sender_role,
            id: self.id.clone(),
            message: self.payload.clone(),
            emitted_at: Some(self.emitted_at),
        }
    }
}

/// A validated change to the presence set.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceChange {
    /// Complete snapshot; replaces everything known.
    State(HashMap<ParticipantId, PresenceMeta>),
    /// Incremental update. Leaves apply before joins, so a re-track
    /// (leave old meta + join new meta for one key) keeps the key.
    Diff {
        joins: HashMap<ParticipantId, PresenceMeta>,
        leaves: Vec<ParticipantId>,
    },
}

/// Closed set of messages the session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    Presence(PresenceChange),
    Pulse(PulseEvent),
}

impl SyncMessage {
    /// Validate a transport event.
    ///
    /// Returns `Ok(None)` for lifecycle events that carry no message
    /// (connect, join acks, errors).
    pub fn decode(event: &RealtimeEvent) -> Result<Option<SyncMessage>, ProtocolError> {
        let msg = match event {
            RealtimeEvent::PresenceState { state, .. } => {
                SyncMessage::Presence(PresenceChange::State(decode_metas(state)))
            }
            RealtimeEvent::PresenceDiff { joins, leaves, .. } => {
                SyncMessage::Presence(PresenceChange::Diff {
                    joins: decode_metas(joins),
                    leaves: leaves.keys().cloned().map(ParticipantId::from_key).collect(),
                })
            }
            RealtimeEvent::Broadcast { event, payload, .. } => {
                SyncMessage::Pulse(decode_pulse(event, payload)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(msg))
    }
}

/// Validate a broadcast as a pulse.
pub fn decode_pulse(event: &str, payload: &serde_json::Value) -> Result<PulseEvent, ProtocolError> {
    if event != events::PULSE {
        return Err(ProtocolError::UnexpectedEvent(event.to_string()));
    }
    let parsed: BroadcastPayload = serde_json::from_value(payload.clone())
        .map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    let BroadcastPayload::Pulse {
        from,
        id,
        message,
        emitted_at,
    } = parsed;

    if !from.is_participant() {
        return Err(ProtocolError::Malformed("pulse sent by a guest".into()));
    }
    if let Some(m) = &message {
        if m.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ProtocolError::Malformed(format!(
                "pulse message longer than {MAX_MESSAGE_CHARS} characters"
            )));
        }
    }

    Ok(PulseEvent {
        sender_role: from,
        emitted_at: emitted_at.unwrap_or_else(Utc::now),
        payload: message,
        id,
    })
}

/// Parse the first meta under each key; malformed entries are skipped.
fn decode_metas(map: &PresenceMap) -> HashMap<ParticipantId, PresenceMeta> {
    let mut out = HashMap::new();
    for (key, metas) in map {
        let Some(first) = metas.first() else {
            continue;
        };
        match serde_json::from_value::<PresenceMeta>(first.clone()) {
            Ok(meta) => {
                out.insert(ParticipantId::from_key(key.clone()), meta);
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Ignoring malformed presence meta");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcast(event: &str, payload: serde_json::Value) -> RealtimeEvent {
        RealtimeEvent::Broadcast {
            topic: "love_room".into(),
            event: event.into(),
            payload,
        }
    }

    #[test]
    fn pulse_payload_wire_shape() {
        let pulse = PulseEvent::new(Role::A, Some("miss you".into()));
        let json = serde_json::to_value(pulse.to_payload()).unwrap();
        assert_eq!(json["type"], "pulse");
        assert_eq!(json["from"], "A");
        assert_eq!(json["message"], "miss you");
        assert!(json["id"].is_string());
    }

    #[test]
    fn minimal_pulse_decodes() {
        let msg = SyncMessage::decode(&broadcast(
            "pulse",
            serde_json::json!({ "type": "pulse", "from": "B" }),
        ))
        .unwrap();
        match msg {
            Some(SyncMessage::Pulse(p)) => {
                assert_eq!(p.sender_role, Role::B);
                assert!(p.payload.is_none());
                assert!(p.id.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_event_name_rejected() {
        let err = SyncMessage::decode(&broadcast("heartbeat", serde_json::json!({ "from": "me" })))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedEvent(e) if e == "heartbeat"));
    }

    #[test]
    fn malformed_pulses_rejected() {
        let cases = [
            serde_json::json!({ "type": "pulse" }),
            serde_json::json!({ "type": "pulse", "from": "me" }),
            serde_json::json!({ "type": "poke", "from": "A" }),
            serde_json::json!("pulse"),
            serde_json::json!({ "type": "pulse", "from": "guest" }),
            serde_json::json!({ "type": "pulse", "from": "A", "message": "x".repeat(MAX_MESSAGE_CHARS + 1) }),
        ];
        for payload in cases {
            let result = decode_pulse("pulse", &payload);
            assert!(
                matches!(result, Err(ProtocolError::Malformed(_))),
                "accepted {payload}"
            );
        }
    }

    #[test]
    fn presence_state_skips_bad_metas() {
        let mut state = PresenceMap::new();
        state.insert(
            "user_a".into(),
            vec![serde_json::json!({ "role": "A", "is_active": true, "phx_ref": "F1" })],
        );
        state.insert("user_x".into(), vec![serde_json::json!({ "isTouching": true })]);
        state.insert("user_y".into(), vec![]);
        let event = RealtimeEvent::PresenceState {
            topic: "heartbeat-room".into(),
            state,
        };
        match SyncMessage::decode(&event).unwrap() {
            Some(SyncMessage::Presence(PresenceChange::State(map))) => {
                assert_eq!(map.len(), 1);
                let meta = &map[&ParticipantId::from_key("user_a")];
                assert_eq!(meta.role, Role::A);
                assert!(meta.is_active);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn presence_diff_lists_leaving_keys() {
        let mut leaves = PresenceMap::new();
        leaves.insert("user_b".into(), vec![serde_json::json!({})]);
        let event = RealtimeEvent::PresenceDiff {
            topic: "heartbeat-room".into(),
            joins: PresenceMap::new(),
            leaves,
        };
        match SyncMessage::decode(&event).unwrap() {
            Some(SyncMessage::Presence(PresenceChange::Diff { joins, leaves })) => {
                assert!(joins.is_empty());
                assert_eq!(leaves, vec![ParticipantId::from_key("user_b")]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lifecycle_events_carry_no_message() {
        assert!(SyncMessage::decode(&RealtimeEvent::Connected).unwrap().is_none());
        assert!(SyncMessage::decode(&RealtimeEvent::Disconnected).unwrap().is_none());
    }
}
