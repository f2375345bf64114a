use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use heartline_common::SyncError;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::counter::{self, Counter, CounterStore};
use crate::presence::{PeerState, PresenceTracker};
use crate::protocol::{PresenceChange, PulseEvent, SyncMessage};
use crate::pulse::PulseChannel;
use crate::realtime::{RealtimeEvent, RealtimeTransport};
use crate::role::{Participant, Role};

use super::machine::{SyncEffect, SyncState};
use super::view::SyncView;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What drives `remote_active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSignal {
    /// The partner's presence `is_active` flag.
    Presence,
    /// A pulse from the partner keeps them active for `hold`.
    Pulse { hold: Duration },
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub presence_topic: String,
    pub pulse_topic: String,
    pub remote_signal: RemoteSignal,
    pub haptic_pattern: Vec<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            presence_topic: "heartbeat-room".into(),
            pulse_topic: "love_room".into(),
            remote_signal: RemoteSignal::Presence,
            haptic_pattern: vec![100, 50, 100, 50, 200],
        }
    }
}

/// Something that changed as a result of a session call.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Connection(bool),
    Peer(PeerState),
    PulseReceived(PulseEvent),
    Effect(SyncEffect),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One client's view of the shared room.
///
/// Owned by a single event loop; every input arrives through `&mut self`.
pub struct SyncSession {
    participant: Participant,
    config: SessionConfig,
    transport: Arc<dyn RealtimeTransport>,
    store: Arc<dyn CounterStore>,
    presence: PresenceTracker,
    pulses: PulseChannel,
    state: SyncState,
    open: bool,
    /// Set by `disconnect`; the transport is gone after that.
    closed: bool,
    connected: bool,
    counts: Counter,
    last_pulse_received: Option<DateTime<Utc>>,
    remote_hold_until: Option<Instant>,
}

impl SyncSession {
    pub fn new(
        participant: Participant,
        config: SessionConfig,
        transport: Arc<dyn RealtimeTransport>,
        store: Arc<dyn CounterStore>,
    ) -> Self {
        let presence = PresenceTracker::new(participant.clone(), config.presence_topic.clone());
        let pulses = PulseChannel::new(config.pulse_topic.clone(), participant.role());
        let state = SyncState::new(config.haptic_pattern.clone());
        Self {
            participant,
            config,
            transport,
            store,
            presence,
            pulses,
            state,
            open: false,
            closed: false,
            connected: false,
            counts: Counter::default(),
            last_pulse_received: None,
            remote_hold_until: None,
        }
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Seed the counter and join both channels.
    ///
    /// A session is single-use: once disconnected, connecting again fails
    /// with `SyncError::Closed`.
    pub async fn connect(&mut self) -> Result<(), SyncError> {
        if self.closed {
            return Err(SyncError::Closed);
        }
        if self.open {
            return Ok(());
        }
        match self.store.get().await {
            Ok(counts) => self.counts = self.counts.merge_max(counts),
            Err(e) => warn!(error = %e, "Could not read counter; starting from zero"),
        }
        self.presence.join(self.transport.as_ref()).await;
        self.pulses.join(self.transport.as_ref()).await;
        self.open = true;
        info!(
            participant = %self.participant.id(),
            role = %self.participant.role(),
            "Sync session connected"
        );
        Ok(())
    }

    /// Leave both channels, drop the transport, and reset to `Idle`.
    pub async fn disconnect(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        if !self.open {
            return updates;
        }
        self.presence.leave(self.transport.as_ref()).await;
        self.pulses.leave(self.transport.as_ref()).await;
        self.transport.disconnect().await;
        self.open = false;
        self.closed = true;
        self.remote_hold_until = None;
        self.set_connected(false, &mut updates);
        updates.push(SessionUpdate::Peer(PeerState::OFFLINE));
        let effects = self.state.reset();
        push_effects(&mut updates, effects);
        info!(participant = %self.participant.id(), "Sync session disconnected");
        updates
    }

    /// Hold or release the heart.
    pub async fn set_local_active(&mut self, active: bool) -> Vec<SessionUpdate> {
        self.presence
            .set_active(active, self.transport.as_ref())
            .await;
        let mut updates = Vec::new();
        let effects = self.state.set_local(active);
        push_effects(&mut updates, effects);
        updates
    }

    /// Broadcast a pulse and count it for this client's role.
    ///
    /// The broadcast is not retried. A counter failure is logged and the
    /// displayed count still moves.
    pub async fn send_pulse(&mut self, message: Option<String>) -> Result<PulseEvent, SyncError> {
        if self.closed {
            return Err(SyncError::Closed);
        }
        let pulse = self.pulses.send(message, self.transport.as_ref()).await?;
        let role = self.participant.role();
        match counter::increment(self.store.as_ref(), role).await {
            Ok(written) => self.counts = self.counts.merge_max(written),
            Err(e) => {
                warn!(error = %e, role = %role, "Pulse sent but counter not updated");
                self.counts = self.counts.incremented(role);
            }
        }
        Ok(pulse)
    }

    pub fn subscribe_pulses(&self) -> broadcast::Receiver<PulseEvent> {
        self.pulses.subscribe()
    }

    pub async fn handle_event(&mut self, event: RealtimeEvent) -> Vec<SessionUpdate> {
        self.handle_event_at(event, Instant::now()).await
    }

    /// Feed one transport event, using `now` for the pulse hold window.
    pub async fn handle_event_at(&mut self, event: RealtimeEvent, now: Instant) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        if !self.open {
            return updates;
        }

        match &event {
            RealtimeEvent::Connected => self.set_connected(true, &mut updates),
            RealtimeEvent::Disconnected => {
                self.set_connected(false, &mut updates);
                let before = self.presence.peer_state();
                let peer = self.presence.on_link_lost();
                if peer != before {
                    updates.push(SessionUpdate::Peer(peer));
                }
                self.remote_hold_until = None;
                let effects = self.state.set_remote(false);
                push_effects(&mut updates, effects);
            }
            RealtimeEvent::ChannelJoined { topic } => {
                self.set_connected(true, &mut updates);
                if *topic == self.config.presence_topic {
                    self.presence
                        .on_channel_joined(self.transport.as_ref())
                        .await;
                }
            }
            RealtimeEvent::ChannelError { topic, message } => {
                warn!(topic = %topic, message = %message, "Channel error");
            }
            RealtimeEvent::Error(message) => {
                warn!(message = %message, "Realtime transport error");
            }
            RealtimeEvent::PresenceState { topic, .. } | RealtimeEvent::PresenceDiff { topic, .. }
                if *topic != self.config.presence_topic => {}
            RealtimeEvent::Broadcast { topic, .. } if *topic != self.config.pulse_topic => {
                debug!(topic = %topic, "Broadcast on unknown topic ignored");
            }
            _ => match SyncMessage::decode(&event) {
                Ok(Some(SyncMessage::Presence(change))) => {
                    self.on_presence(change, &mut updates);
                }
                Ok(Some(SyncMessage::Pulse(pulse))) => {
                    self.on_pulse(pulse, now, &mut updates);
                }
                Ok(None) => {}
                Err(e) => debug!(error = %e, "Ignoring invalid realtime payload"),
            },
        }
        updates
    }

    /// Expire the pulse hold window.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        if let Some(until) = self.remote_hold_until {
            if now >= until {
                self.remote_hold_until = None;
                let effects = self.state.set_remote(false);
                push_effects(&mut updates, effects);
            }
        }
        updates
    }

    pub fn view(&self) -> SyncView {
        let peer = self.presence.peer_state();
        SyncView {
            connected: self.connected,
            peer_online: peer.peer_online,
            peer_active: peer.peer_active,
            local_active: self.state.local_active(),
            remote_active: self.state.remote_active(),
            synced: self.state.synced(),
            sync_achieved: self.state.sync_achieved(),
            phase: self.state.phase(),
            counts: self.counts,
            last_pulse_received: self.last_pulse_received,
        }
    }

    fn set_connected(&mut self, connected: bool, updates: &mut Vec<SessionUpdate>) {
        if self.connected != connected {
            self.connected = connected;
            updates.push(SessionUpdate::Connection(connected));
        }
    }

    fn on_presence(&mut self, change: PresenceChange, updates: &mut Vec<SessionUpdate>) {
        let before = self.presence.peer_state();
        let peer = self.presence.apply(change);
        if peer != before {
            debug!(online = peer.peer_online, active = peer.peer_active, "Peer state changed");
            updates.push(SessionUpdate::Peer(peer));
        }
        if self.config.remote_signal == RemoteSignal::Presence {
            let effects = self.state.set_remote(peer.peer_active);
            push_effects(updates, effects);
        }
    }

    fn on_pulse(&mut self, pulse: PulseEvent, now: Instant, updates: &mut Vec<SessionUpdate>) {
        let Some(pulse) = self.pulses.deliver(pulse) else {
            return;
        };
        let sender = pulse.sender_role;
        self.counts = self.counts.incremented(sender);
        self.last_pulse_received = Some(Utc::now());
        info!(from = %sender, "Pulse received");
        updates.push(SessionUpdate::PulseReceived(pulse));

        if let RemoteSignal::Pulse { hold } = self.config.remote_signal {
            if self.is_from_peer(sender) {
                self.remote_hold_until = Some(now + hold);
                let effects = self.state.set_remote(true);
                push_effects(updates, effects);
            }
        }
    }

    fn is_from_peer(&self, sender: Role) -> bool {
        sender.is_participant() && sender != self.participant.role()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn push_effects(updates: &mut Vec<SessionUpdate>, effects: Vec<SyncEffect>) {
    updates.extend(effects.into_iter().map(SessionUpdate::Effect));
}
