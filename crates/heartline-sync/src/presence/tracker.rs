//! This client's membership in the presence set.

use std::collections::HashMap;

use chrono::Utc;
use heartline_common::ParticipantId;
use tracing::{debug, info};

use crate::protocol::{PresenceChange, PresenceMeta};
use crate::realtime::{ChannelConfig, RealtimeTransport};
use crate::role::Participant;

use super::types::{PeerState, PresenceRecord};

/// Tracks one client's entry in a presence topic and the peers around it.
pub struct PresenceTracker {
    participant: Participant,
    topic: String,
    records: HashMap<ParticipantId, PresenceRecord>,
    local_active: bool,
    /// Last value handed to the transport since joining.
    published: Option<bool>,
    joined: bool,
    /// Set when the link drops; cleared by the republish after rejoin.
    needs_republish: bool,
    peer: PeerState,
}

impl PresenceTracker {
    pub fn new(participant: Participant, topic: impl Into<String>) -> Self {
        Self {
            participant,
            topic: topic.into(),
            records: HashMap::new(),
            local_active: false,
            published: None,
            joined: false,
            needs_republish: false,
            peer: PeerState::OFFLINE,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn local_active(&self) -> bool {
        self.local_active
    }

    pub fn peer_state(&self) -> PeerState {
        self.peer
    }

    pub fn records(&self) -> impl Iterator<Item = &PresenceRecord> {
        self.records.values()
    }

    /// Join the presence set under this participant's key and publish
    /// the current local state (inactive unless set before joining).
    pub async fn join(&mut self, transport: &dyn RealtimeTransport) {
        let key = self.participant.id().as_str().to_string();
        info!(topic = %self.topic, key = %key, role = %self.participant.role(), "Joining presence");
        transport
            .join_channel(&self.topic, ChannelConfig::presence(&key))
            .await;
        self.joined = true;
        self.needs_republish = false;
        let active = self.local_active;
        self.publish(transport, active).await;
    }

    /// Untrack and leave. Known records are discarded.
    pub async fn leave(&mut self, transport: &dyn RealtimeTransport) {
        if !self.joined {
            return;
        }
        transport.presence_untrack(&self.topic).await;
        transport.leave_channel(&self.topic).await;
        self.joined = false;
        self.published = None;
        self.local_active = false;
        self.records.clear();
        self.peer = PeerState::OFFLINE;
    }

    /// Set the local activity flag, republishing only when it changes.
    ///
    /// Returns true if a presence update was sent.
    pub async fn set_active(&mut self, active: bool, transport: &dyn RealtimeTransport) -> bool {
        self.local_active = active;
        if !self.joined || self.published == Some(active) {
            return false;
        }
        self.publish(transport, active).await;
        true
    }

    async fn publish(&mut self, transport: &dyn RealtimeTransport, active: bool) {
        let meta = PresenceMeta::new(self.participant.role(), active);
        match serde_json::to_value(&meta) {
            Ok(payload) => {
                transport.presence_track(&self.topic, payload).await;
                self.published = Some(active);
                debug!(topic = %self.topic, is_active = active, "Presence published");
            }
            Err(e) => debug!(error = %e, "Presence meta did not serialize"),
        }
    }

    /// Fold a presence change into the known set and recompute peer state.
    pub fn apply(&mut self, change: PresenceChange) -> PeerState {
        let seen = Utc::now();
        let to_record = |id: ParticipantId, meta: PresenceMeta| PresenceRecord {
            participant_id: id,
            role: meta.role,
            is_active: meta.is_active,
            last_seen: seen,
        };
        match change {
            PresenceChange::State(state) => {
                self.records = state
                    .into_iter()
                    .map(|(id, meta)| (id.clone(), to_record(id, meta)))
                    .collect();
            }
            PresenceChange::Diff { joins, leaves } => {
                for id in leaves {
                    self.records.remove(&id);
                }
                for (id, meta) in joins {
                    self.records.insert(id.clone(), to_record(id, meta));
                }
            }
        }
        self.recompute()
    }

    /// The link dropped: forget everyone until the set is re-sent.
    pub fn on_link_lost(&mut self) -> PeerState {
        self.records.clear();
        if self.joined {
            self.needs_republish = true;
        }
        self.peer = PeerState::OFFLINE;
        self.peer
    }

    /// The presence channel was (re)joined. After an outage, publish the
    /// current local state again.
    pub async fn on_channel_joined(&mut self, transport: &dyn RealtimeTransport) {
        if !self.joined || !self.needs_republish {
            return;
        }
        self.needs_republish = false;
        let active = self.local_active;
        self.publish(transport, active).await;
        info!(topic = %self.topic, is_active = active, "Presence restored after reconnect");
    }

    fn recompute(&mut self) -> PeerState {
        let me = self.participant.id();
        let my_role = self.participant.role();
        let mut peer = PeerState::OFFLINE;
        for record in self.records.values() {
            let is_peer = record.participant_id != *me
                && record.role.is_participant()
                && record.role != my_role;
            if is_peer {
                peer.peer_online = true;
                peer.peer_active |= record.is_active;
            }
        }
        self.peer = peer;
        peer
    }
}
