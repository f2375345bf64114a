use serde::{Deserialize, Serialize};
use std::fmt;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Short hex id attached to outgoing pulses so echoes can be recognized.
pub fn new_pulse_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// Per-client presence key. Fresh for every session, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new() -> Self {
        Self(format!("user_{}", new_id()))
    }

    pub fn from_key(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_valid_uuid() {
        let id = new_id();
        let parsed = uuid::Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn pulse_id_is_short_hex() {
        let pid = new_pulse_id();
        assert_eq!(pid.len(), 8);
        assert!(pid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn participant_ids_are_unique_and_prefixed() {
        let a = ParticipantId::new();
        let b = ParticipantId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("user_"));
    }

    #[test]
    fn participant_id_from_key_round_trips_display() {
        let pid = ParticipantId::from_key("user_abc");
        assert_eq!(pid.to_string(), "user_abc");
        assert_eq!(pid, ParticipantId::from_key(String::from("user_abc")));
    }

    #[test]
    fn participant_id_serializes_as_plain_string() {
        let pid = ParticipantId::from_key("user_xyz");
        let json = serde_json::to_string(&pid).unwrap();
        assert_eq!(json, "\"user_xyz\"");
    }
}
