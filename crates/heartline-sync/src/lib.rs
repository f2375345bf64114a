//! Realtime sync core for a two-person room: who is here, who is holding
//! the heart, and how many pulses each side has sent.

pub mod counter;
pub mod display;
pub mod presence;
pub mod protocol;
pub mod pulse;
pub mod realtime;
pub mod role;
pub mod session;

pub use counter::{Counter, CounterPatch, CounterStore, MemoryCounterStore, RestCounterStore};
pub use presence::{PeerState, PresenceRecord, PresenceTracker};
pub use protocol::{PresenceChange, PresenceMeta, PulseEvent, SyncMessage};
pub use pulse::PulseChannel;
pub use realtime::{LoopbackClient, LoopbackHub, RealtimeClient, RealtimeConfig, RealtimeEvent, RealtimeTransport};
pub use role::{Participant, Role, RoleResolver};
pub use session::{
    LinkStatus, RemoteSignal, SessionConfig, SessionUpdate, SyncEffect, SyncPhase, SyncSession,
    SyncView,
};
