//! In-process stand-in for the realtime server.
//!
//! `LoopbackHub` keeps the same bookkeeping a Supabase Realtime node does
//! (channel membership, presence per key, broadcast fan-out) and delivers
//! events through the same `mpsc` receivers `RealtimeClient` hands out.
//! Delivery is at-most-once: a full or closed receiver loses the event.
//! Individual clients can be severed and restored to simulate outages.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::transport::RealtimeTransport;
use super::types::{ChannelConfig, PresenceMap, RealtimeEvent};

// ---------------------------------------------------------------------------
// Hub State
// ---------------------------------------------------------------------------

type ClientId = u64;

struct Membership {
    config: ChannelConfig,
    tracked: Option<serde_json::Value>,
}

struct Slot {
    events: mpsc::Sender<RealtimeEvent>,
    online: bool,
    channels: HashMap<String, Membership>,
}

#[derive(Default)]
struct HubState {
    next_id: ClientId,
    slots: HashMap<ClientId, Slot>,
}

impl HubState {
    fn send(&self, id: ClientId, event: RealtimeEvent) {
        let Some(slot) = self.slots.get(&id) else {
            return;
        };
        if let Err(e) = slot.events.try_send(event) {
            warn!(client = id, error = %e, "Loopback event dropped");
        }
    }

    /// Online clients joined to `topic`.
    fn members(&self, topic: &str) -> Vec<ClientId> {
        self.slots
            .iter()
            .filter(|(_, s)| s.online && s.channels.contains_key(topic))
            .map(|(id, _)| *id)
            .collect()
    }

    fn presence_of(&self, topic: &str) -> PresenceMap {
        let mut map: PresenceMap = HashMap::new();
        for slot in self.slots.values().filter(|s| s.online) {
            if let Some(m) = slot.channels.get(topic) {
                if let Some(meta) = &m.tracked {
                    map.entry(m.config.presence.key.clone())
                        .or_default()
                        .push(meta.clone());
                }
            }
        }
        map
    }

    fn presence_key(&self, id: ClientId, topic: &str) -> Option<String> {
        self.slots
            .get(&id)?
            .channels
            .get(topic)
            .map(|m| m.config.presence.key.clone())
    }

    /// Fan a presence diff for one key out to every online member of `topic`.
    fn diff(
        &self,
        topic: &str,
        key: &str,
        joined: Option<serde_json::Value>,
        left: Option<serde_json::Value>,
    ) {
        let mut joins = PresenceMap::new();
        let mut leaves = PresenceMap::new();
        if let Some(meta) = joined {
            joins.insert(key.to_string(), vec![meta]);
        }
        if let Some(meta) = left {
            leaves.insert(key.to_string(), vec![meta]);
        }
        for member in self.members(topic) {
            self.send(
                member,
                RealtimeEvent::PresenceDiff {
                    topic: topic.to_string(),
                    joins: joins.clone(),
                    leaves: leaves.clone(),
                },
            );
        }
    }

    /// Acknowledge a join to `id` and hand it the current presence set.
    fn announce_join(&self, id: ClientId, topic: &str) {
        self.send(
            id,
            RealtimeEvent::ChannelJoined {
                topic: topic.to_string(),
            },
        );
        self.send(
            id,
            RealtimeEvent::PresenceState {
                topic: topic.to_string(),
                state: self.presence_of(topic),
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// In-memory realtime server shared by any number of `LoopbackClient`s.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attach a new client. Mirrors `RealtimeClient::connect`.
    pub fn connect(&self) -> (LoopbackClient, mpsc::Receiver<RealtimeEvent>) {
        let (events, event_rx) = mpsc::channel(256);
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.slots.insert(
            id,
            Slot {
                events,
                online: true,
                channels: HashMap::new(),
            },
        );
        state.send(id, RealtimeEvent::Connected);
        debug!(client = id, "Loopback client connected");

        (
            LoopbackClient {
                hub: self.clone(),
                id,
            },
            event_rx,
        )
    }

    /// Presence keys currently visible on `topic`.
    pub fn presence_keys(&self, topic: &str) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().presence_of(topic).into_keys().collect();
        keys.sort();
        keys
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One client's connection to a `LoopbackHub`.
pub struct LoopbackClient {
    hub: LoopbackHub,
    id: ClientId,
}

impl LoopbackClient {
    /// Drop this client's link: it sees `Disconnected`, everyone else
    /// sees its presence leave. Channel membership is remembered.
    pub fn sever(&self) {
        let mut state = self.hub.lock();
        let Some(slot) = state.slots.get_mut(&self.id) else {
            return;
        };
        if !slot.online {
            return;
        }
        slot.online = false;
        let tracked: Vec<(String, String, serde_json::Value)> = slot
            .channels
            .iter()
            .filter_map(|(topic, m)| {
                m.tracked
                    .clone()
                    .map(|meta| (topic.clone(), m.config.presence.key.clone(), meta))
            })
            .collect();
        for (topic, key, meta) in tracked {
            state.diff(&topic, &key, None, Some(meta));
        }
        state.send(self.id, RealtimeEvent::Disconnected);
        debug!(client = self.id, "Loopback client severed");
    }

    /// Bring the link back: rejoin remembered channels and re-track
    /// their last presence payload, as `RealtimeClient` does on reconnect.
    pub fn restore(&self) {
        let mut state = self.hub.lock();
        let Some(slot) = state.slots.get_mut(&self.id) else {
            return;
        };
        if slot.online {
            return;
        }
        slot.online = true;
        let topics: Vec<String> = slot.channels.keys().cloned().collect();
        state.send(self.id, RealtimeEvent::Connected);
        for topic in topics {
            state.announce_join(self.id, &topic);
            let tracked = state
                .slots
                .get(&self.id)
                .and_then(|s| s.channels.get(&topic))
                .and_then(|m| m.tracked.clone().map(|t| (m.config.presence.key.clone(), t)));
            if let Some((key, meta)) = tracked {
                state.diff(&topic, &key, Some(meta), None);
            }
        }
        debug!(client = self.id, "Loopback client restored");
    }

    pub fn is_online(&self) -> bool {
        self.hub
            .lock()
            .slots
            .get(&self.id)
            .map(|s| s.online)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[async_trait]
impl RealtimeTransport for LoopbackClient {
    async fn join_channel(&self, topic: &str, config: ChannelConfig) {
        let mut state = self.hub.lock();
        let Some(slot) = state.slots.get_mut(&self.id) else {
            return;
        };
        let online = slot.online;
        let previous = slot.channels.insert(
            topic.to_string(),
            Membership {
                config,
                tracked: None,
            },
        );
        if !online {
            return;
        }
        if let Some(Membership {
            config,
            tracked: Some(meta),
        }) = previous
        {
            state.diff(topic, &config.presence.key, None, Some(meta));
        }
        state.announce_join(self.id, topic);
    }

    async fn leave_channel(&self, topic: &str) {
        let mut state = self.hub.lock();
        let Some(slot) = state.slots.get_mut(&self.id) else {
            return;
        };
        let online = slot.online;
        if let Some(Membership {
            config,
            tracked: Some(meta),
        }) = slot.channels.remove(topic)
        {
            if online {
                state.diff(topic, &config.presence.key, None, Some(meta));
            }
        }
    }

    async fn broadcast(&self, topic: &str, event: &str, payload: serde_json::Value) {
        let state = self.hub.lock();
        let Some(slot) = state.slots.get(&self.id) else {
            return;
        };
        let Some(membership) = slot.channels.get(topic) else {
            debug!(topic = %topic, "Broadcast on unjoined channel dropped");
            return;
        };
        if !slot.online {
            return;
        }
        let self_send = membership.config.broadcast.self_send;
        for member in state.members(topic) {
            if member == self.id && !self_send {
                continue;
            }
            state.send(
                member,
                RealtimeEvent::Broadcast {
                    topic: topic.to_string(),
                    event: event.to_string(),
                    payload: payload.clone(),
                },
            );
        }
    }

    async fn presence_track(&self, topic: &str, payload: serde_json::Value) {
        let mut state = self.hub.lock();
        let Some(slot) = state.slots.get_mut(&self.id) else {
            return;
        };
        let online = slot.online;
        let Some(membership) = slot.channels.get_mut(topic) else {
            return;
        };
        let previous = membership.tracked.replace(payload.clone());
        if online {
            if let Some(key) = state.presence_key(self.id, topic) {
                state.diff(topic, &key, Some(payload), previous);
            }
        }
    }

    async fn presence_untrack(&self, topic: &str) {
        let mut state = self.hub.lock();
        let Some(slot) = state.slots.get_mut(&self.id) else {
            return;
        };
        let online = slot.online;
        let Some(previous) = slot.channels.get_mut(topic).and_then(|m| m.tracked.take()) else {
            return;
        };
        if online {
            if let Some(key) = state.presence_key(self.id, topic) {
                state.diff(topic, &key, None, Some(previous));
            }
        }
    }

    async fn disconnect(&self) {
        let mut state = self.hub.lock();
        let Some(slot) = state.slots.remove(&self.id) else {
            return;
        };
        if slot.online {
            for (topic, m) in &slot.channels {
                if let Some(meta) = &m.tracked {
                    state.diff(topic, &m.config.presence.key, None, Some(meta.clone()));
                }
            }
            if let Err(e) = slot.events.try_send(RealtimeEvent::Disconnected) {
                debug!(client = self.id, error = %e, "Disconnect notice dropped");
            }
        }
        debug!(client = self.id, "Loopback client disconnected");
    }
}
