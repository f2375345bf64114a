use std::collections::HashMap;

use heartline_common::ParticipantId;
use tokio::sync::mpsc;

use super::*;
use crate::protocol::{PresenceChange, PresenceMeta, SyncMessage};
use crate::realtime::{LoopbackHub, RealtimeEvent};
use crate::role::{Participant, Role};

const TOPIC: &str = "heartbeat-room";

fn participant(key: &str, role: Role) -> Participant {
    Participant::with_id(ParticipantId::from_key(key), role)
}

fn meta(role: Role, active: bool) -> PresenceMeta {
    PresenceMeta {
        role,
        is_active: active,
        online_at: None,
    }
}

fn state(entries: &[(&str, Role, bool)]) -> PresenceChange {
    PresenceChange::State(
        entries
            .iter()
            .map(|(k, r, a)| (ParticipantId::from_key(*k), meta(*r, *a)))
            .collect(),
    )
}

/// Feed every queued event into the tracker, the way a session would.
fn pump(tracker: &mut PresenceTracker, rx: &mut mpsc::Receiver<RealtimeEvent>) -> Vec<RealtimeEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match &event {
            RealtimeEvent::Disconnected => {
                tracker.on_link_lost();
            }
            other => {
                if let Ok(Some(SyncMessage::Presence(change))) = SyncMessage::decode(other) {
                    tracker.apply(change);
                }
            }
        }
        seen.push(event);
    }
    seen
}

fn track_count(events: &[RealtimeEvent], key: &str) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RealtimeEvent::PresenceDiff { joins, .. } if joins.contains_key(key)))
        .count()
}

#[test]
fn counterpart_is_peer_and_self_is_not() {
    let mut tracker = PresenceTracker::new(participant("me", Role::A), TOPIC);
    let peer = tracker.apply(state(&[("me", Role::A, true)]));
    assert_eq!(peer, PeerState::OFFLINE);

    let peer = tracker.apply(state(&[("me", Role::A, true), ("them", Role::B, false)]));
    assert!(peer.peer_online);
    assert!(!peer.peer_active);
}

#[test]
fn guests_and_same_role_tabs_are_not_peers() {
    let mut tracker = PresenceTracker::new(participant("me", Role::A), TOPIC);
    let peer = tracker.apply(state(&[
        ("me", Role::A, false),
        ("other-tab", Role::A, true),
        ("visitor", Role::Guest, true),
    ]));
    assert_eq!(peer, PeerState::OFFLINE);
}

#[test]
fn guest_observer_sees_either_participant() {
    let mut tracker = PresenceTracker::new(participant("watcher", Role::Guest), TOPIC);
    let peer = tracker.apply(state(&[("her", Role::A, true)]));
    assert!(peer.peer_online);
    assert!(peer.peer_active);
}

#[test]
fn diff_applies_leaves_before_joins() {
    let mut tracker = PresenceTracker::new(participant("me", Role::A), TOPIC);
    tracker.apply(state(&[("them", Role::B, false)]));

    let mut joins = HashMap::new();
    joins.insert(ParticipantId::from_key("them"), meta(Role::B, true));
    let peer = tracker.apply(PresenceChange::Diff {
        joins,
        leaves: vec![ParticipantId::from_key("them")],
    });
    assert!(peer.peer_online);
    assert!(peer.peer_active);
    assert_eq!(tracker.records().count(), 1);

    let peer = tracker.apply(PresenceChange::Diff {
        joins: HashMap::new(),
        leaves: vec![ParticipantId::from_key("them")],
    });
    assert_eq!(peer, PeerState::OFFLINE);
}

#[test]
fn link_loss_degrades_to_offline() {
    let mut tracker = PresenceTracker::new(participant("me", Role::B), TOPIC);
    tracker.apply(state(&[("them", Role::A, true)]));
    assert!(tracker.peer_state().peer_active);

    let peer = tracker.on_link_lost();
    assert_eq!(peer, PeerState::OFFLINE);
    assert_eq!(tracker.records().count(), 0);
}

#[tokio::test]
async fn set_active_publishes_only_on_change() {
    let hub = LoopbackHub::new();
    let (client, mut rx) = hub.connect();
    let mut tracker = PresenceTracker::new(participant("me", Role::A), TOPIC);
    tracker.join(&client).await;
    pump(&mut tracker, &mut rx);

    assert!(tracker.set_active(true, &client).await);
    assert!(!tracker.set_active(true, &client).await);
    assert!(!tracker.set_active(true, &client).await);
    let events = pump(&mut tracker, &mut rx);
    assert_eq!(track_count(&events, "me"), 1);

    assert!(tracker.set_active(false, &client).await);
    assert!(!tracker.local_active());
}

#[tokio::test]
async fn set_active_before_join_is_published_on_join() {
    let hub = LoopbackHub::new();
    let (client, _rx) = hub.connect();
    let (b_client, mut b_rx) = hub.connect();
    let mut tracker = PresenceTracker::new(participant("me", Role::A), TOPIC);
    assert!(!tracker.set_active(true, &client).await);
    assert!(tracker.local_active());
    assert!(hub.presence_keys(TOPIC).is_empty());

    tracker.join(&client).await;
    assert!(tracker.local_active());
    let mut b = PresenceTracker::new(participant("him", Role::B), TOPIC);
    b.join(&b_client).await;
    pump(&mut b, &mut b_rx);
    assert!(b.peer_state().peer_active);

    // Already published on join, so this is a no-op.
    assert!(!tracker.set_active(true, &client).await);
}

#[tokio::test]
async fn two_trackers_see_each_other() {
    let hub = LoopbackHub::new();
    let (a_client, mut a_rx) = hub.connect();
    let (b_client, mut b_rx) = hub.connect();
    let mut a = PresenceTracker::new(participant("her", Role::A), TOPIC);
    let mut b = PresenceTracker::new(participant("him", Role::B), TOPIC);

    a.join(&a_client).await;
    b.join(&b_client).await;
    pump(&mut a, &mut a_rx);
    pump(&mut b, &mut b_rx);
    assert!(a.peer_state().peer_online);
    assert!(b.peer_state().peer_online);
    assert!(!a.peer_state().peer_active);

    b.set_active(true, &b_client).await;
    pump(&mut a, &mut a_rx);
    assert!(a.peer_state().peer_active);

    b.leave(&b_client).await;
    pump(&mut a, &mut a_rx);
    assert_eq!(a.peer_state(), PeerState::OFFLINE);
    assert!(!b.is_joined());
}

#[tokio::test]
async fn state_is_republished_after_outage() {
    let hub = LoopbackHub::new();
    let (a_client, mut a_rx) = hub.connect();
    let (b_client, mut b_rx) = hub.connect();
    let mut a = PresenceTracker::new(participant("her", Role::A), TOPIC);
    let mut b = PresenceTracker::new(participant("him", Role::B), TOPIC);
    a.join(&a_client).await;
    b.join(&b_client).await;
    a.set_active(true, &a_client).await;
    pump(&mut a, &mut a_rx);
    pump(&mut b, &mut b_rx);
    assert!(b.peer_state().peer_active);

    a_client.sever();
    pump(&mut a, &mut a_rx);
    pump(&mut b, &mut b_rx);
    assert_eq!(a.peer_state(), PeerState::OFFLINE);
    assert_eq!(b.peer_state(), PeerState::OFFLINE);
    assert!(a.local_active());

    a_client.restore();
    let events = pump(&mut a, &mut a_rx);
    for event in &events {
        if matches!(event, RealtimeEvent::ChannelJoined { .. }) {
            a.on_channel_joined(&a_client).await;
        }
    }
    pump(&mut a, &mut a_rx);
    pump(&mut b, &mut b_rx);
    assert!(a.peer_state().peer_online);
    assert!(b.peer_state().peer_active);
    assert_eq!(hub.presence_keys(TOPIC), vec!["her".to_string(), "him".to_string()]);
}
