//! Ephemeral "thinking of you" pulses.
//!
//! Pulses ride the broadcast channel and are never stored. Sending is
//! fire-and-forget: a pulse emitted while the partner is offline is lost.

use std::collections::VecDeque;

use heartline_common::{ProtocolError, SyncError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::protocol::{events, PulseEvent, MAX_MESSAGE_CHARS};
use crate::realtime::{ChannelConfig, RealtimeTransport};
use crate::role::Role;

/// How many of our own pulse ids to remember for echo suppression.
const RECENT_SENT: usize = 32;

pub struct PulseChannel {
    topic: String,
    role: Role,
    tx: broadcast::Sender<PulseEvent>,
    sent_ids: VecDeque<String>,
    joined: bool,
}

impl PulseChannel {
    pub fn new(topic: impl Into<String>, role: Role) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            topic: topic.into(),
            role,
            tx,
            sent_ids: VecDeque::with_capacity(RECENT_SENT),
            joined: false,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub async fn join(&mut self, transport: &dyn RealtimeTransport) {
        transport
            .join_channel(&self.topic, ChannelConfig::broadcast_only())
            .await;
        self.joined = true;
        info!(topic = %self.topic, "Joined pulse channel");
    }

    pub async fn leave(&mut self, transport: &dyn RealtimeTransport) {
        if !self.joined {
            return;
        }
        transport.leave_channel(&self.topic).await;
        self.joined = false;
        self.sent_ids.clear();
    }

    /// Broadcast a pulse from this client's role.
    ///
    /// Guests may not send. Messages longer than the wire limit are
    /// truncated. The returned event is what went out.
    pub async fn send(
        &mut self,
        message: Option<String>,
        transport: &dyn RealtimeTransport,
    ) -> Result<PulseEvent, SyncError> {
        if !self.role.is_participant() {
            return Err(SyncError::Unauthorized {
                role: self.role.to_string(),
                action: "send a pulse",
            });
        }
        if !self.joined {
            return Err(SyncError::NotConnected);
        }

        let message = message.map(|m| {
            if m.chars().count() > MAX_MESSAGE_CHARS {
                warn!(limit = MAX_MESSAGE_CHARS, "Pulse message truncated");
                m.chars().take(MAX_MESSAGE_CHARS).collect()
            } else {
                m
            }
        });
        let pulse = PulseEvent::new(self.role, message);
        let payload = encode(&pulse)?;
        if let Some(id) = &pulse.id {
            if self.sent_ids.len() == RECENT_SENT {
                self.sent_ids.pop_front();
            }
            self.sent_ids.push_back(id.clone());
        }
        transport.broadcast(&self.topic, events::PULSE, payload).await;
        debug!(topic = %self.topic, role = %self.role, "Pulse sent");
        Ok(pulse)
    }

    /// Subscribe to pulses received from the partner.
    pub fn subscribe(&self) -> broadcast::Receiver<PulseEvent> {
        self.tx.subscribe()
    }

    /// Hand a validated incoming pulse to subscribers.
    ///
    /// Echoes of our own pulses are dropped and yield `None`.
    pub fn deliver(&self, pulse: PulseEvent) -> Option<PulseEvent> {
        if let Some(id) = &pulse.id {
            if self.sent_ids.iter().any(|sent| sent == id) {
                debug!(id = %id, "Dropping echo of own pulse");
                return None;
            }
        }
        // No subscribers is fine.
        let _ = self.tx.send(pulse.clone());
        Some(pulse)
    }
}

fn encode(pulse: &PulseEvent) -> Result<serde_json::Value, ProtocolError> {
    serde_json::to_value(pulse.to_payload()).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SyncMessage;
    use crate::realtime::{LoopbackHub, RealtimeEvent};
    use tokio::sync::mpsc;

    fn pulses(rx: &mut mpsc::Receiver<RealtimeEvent>) -> Vec<PulseEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let Ok(Some(SyncMessage::Pulse(p))) = SyncMessage::decode(&event) {
                out.push(p);
            }
        }
        out
    }

    #[tokio::test]
    async fn pulse_reaches_partner_with_sender_role() {
        let hub = LoopbackHub::new();
        let (a_client, _a_rx) = hub.connect();
        let (b_client, mut b_rx) = hub.connect();
        let mut a = PulseChannel::new("love_room", Role::A);
        let mut b = PulseChannel::new("love_room", Role::B);
        a.join(&a_client).await;
        b.join(&b_client).await;
        let mut sub = b.subscribe();

        let sent = a.send(Some("hi".into()), &a_client).await.unwrap();
        let received = pulses(&mut b_rx);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].sender_role, Role::A);
        assert_eq!(received[0].id, sent.id);

        let delivered = b.deliver(received[0].clone()).unwrap();
        assert_eq!(delivered.payload.as_deref(), Some("hi"));
        assert_eq!(sub.try_recv().unwrap().sender_role, Role::A);
    }

    #[tokio::test]
    async fn guest_cannot_send() {
        let hub = LoopbackHub::new();
        let (client, _rx) = hub.connect();
        let mut guest = PulseChannel::new("love_room", Role::Guest);
        guest.join(&client).await;
        let err = guest.send(None, &client).await.unwrap_err();
        assert!(matches!(err, SyncError::Unauthorized { action: "send a pulse", .. }));
        assert_eq!(err.to_string(), "guest may not send a pulse");
    }

    #[tokio::test]
    async fn send_before_join_is_not_connected() {
        let hub = LoopbackHub::new();
        let (client, _rx) = hub.connect();
        let mut a = PulseChannel::new("love_room", Role::A);
        assert!(matches!(
            a.send(None, &client).await,
            Err(SyncError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn own_echo_is_dropped() {
        let hub = LoopbackHub::new();
        let (client, _rx) = hub.connect();
        let mut a = PulseChannel::new("love_room", Role::A);
        a.join(&client).await;
        let sent = a.send(None, &client).await.unwrap();
        assert!(a.deliver(sent).is_none());

        let foreign = PulseEvent::new(Role::B, None);
        assert!(a.deliver(foreign).is_some());
    }

    #[tokio::test]
    async fn offline_partner_misses_pulse() {
        let hub = LoopbackHub::new();
        let (a_client, _a_rx) = hub.connect();
        let (b_client, mut b_rx) = hub.connect();
        let mut a = PulseChannel::new("love_room", Role::A);
        let mut b = PulseChannel::new("love_room", Role::B);
        a.join(&a_client).await;
        b.join(&b_client).await;

        b_client.sever();
        a.send(None, &a_client).await.unwrap();
        b_client.restore();
        assert!(pulses(&mut b_rx).is_empty());
    }

    #[test]
    fn encoded_payload_is_the_wire_shape() {
        let pulse = PulseEvent::new(Role::B, Some("hi".into()));
        let payload = encode(&pulse).unwrap();
        assert_eq!(payload["type"], "pulse");
        assert_eq!(payload["from"], "B");
        assert_eq!(payload["message"], "hi");
        assert_eq!(payload["id"].as_str(), pulse.id.as_deref());
    }

    #[tokio::test]
    async fn returned_pulse_is_the_one_broadcast() {
        let hub = LoopbackHub::new();
        let (a_client, _a_rx) = hub.connect();
        let (b_client, mut b_rx) = hub.connect();
        let mut a = PulseChannel::new("love_room", Role::A);
        let mut b = PulseChannel::new("love_room", Role::B);
        a.join(&a_client).await;
        b.join(&b_client).await;

        let mut sent = Vec::new();
        for _ in 0..3 {
            sent.push(a.send(None, &a_client).await.unwrap().id);
        }
        let received: Vec<_> = pulses(&mut b_rx).into_iter().map(|p| p.id).collect();
        assert_eq!(received, sent);
    }

    #[tokio::test]
    async fn long_message_is_truncated() {
        let hub = LoopbackHub::new();
        let (a_client, _a_rx) = hub.connect();
        let (b_client, mut b_rx) = hub.connect();
        let mut a = PulseChannel::new("love_room", Role::A);
        let mut b = PulseChannel::new("love_room", Role::B);
        a.join(&a_client).await;
        b.join(&b_client).await;

        let sent = a
            .send(Some("♥".repeat(MAX_MESSAGE_CHARS + 10)), &a_client)
            .await
            .unwrap();
        assert_eq!(sent.payload.unwrap().chars().count(), MAX_MESSAGE_CHARS);
        assert_eq!(pulses(&mut b_rx).len(), 1);
    }
}
