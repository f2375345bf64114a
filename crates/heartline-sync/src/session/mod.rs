//! Per-client sync session: presence, pulses, and the counter wired
//! into one state machine.

mod driver;
mod machine;
mod view;


pub use driver::{RemoteSignal, SessionConfig, SessionUpdate, SyncSession};
pub use machine::{SyncEffect, SyncPhase, SyncState};
pub use view::{LinkStatus, SyncView};
