use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::counter::Counter;

use super::machine::SyncPhase;

/// Everything a front-end needs to draw the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncView {
    pub connected: bool,
    pub peer_online: bool,
    pub peer_active: bool,
    pub local_active: bool,
    pub remote_active: bool,
    pub synced: bool,
    pub sync_achieved: bool,
    pub phase: SyncPhase,
    pub counts: Counter,
    pub last_pulse_received: Option<DateTime<Utc>>,
}

/// Connection badge shown above the heart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    WaitingForPartner,
    PartnerHere,
}

impl LinkStatus {
    pub fn label(self) -> &'static str {
        match self {
            LinkStatus::Connecting => "Connecting...",
            LinkStatus::WaitingForPartner => "Waiting for partner",
            LinkStatus::PartnerHere => "Partner is here",
        }
    }
}

impl SyncView {
    pub fn link_status(&self) -> LinkStatus {
        if !self.connected {
            LinkStatus::Connecting
        } else if self.peer_online {
            LinkStatus::PartnerHere
        } else {
            LinkStatus::WaitingForPartner
        }
    }
}
