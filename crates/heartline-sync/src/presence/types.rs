//! Presence record and derived peer state.

use chrono::{DateTime, Utc};
use heartline_common::ParticipantId;

use crate::role::Role;

/// One connected client as seen through the presence set.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceRecord {
    pub participant_id: ParticipantId,
    pub role: Role,
    pub is_active: bool,
    pub last_seen: DateTime<Utc>,
}

/// What the session needs to know about the partner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerState {
    pub peer_online: bool,
    pub peer_active: bool,
}

impl PeerState {
    pub const OFFLINE: PeerState = PeerState {
        peer_online: false,
        peer_active: false,
    };
}
