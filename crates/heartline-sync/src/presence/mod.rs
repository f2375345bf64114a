//! Presence tracking for the two-party room.
//!
//! Keeps this client's entry in the shared presence set and reduces the
//! set to two booleans about the partner: is anyone of the other role
//! here, and is any of them active.

mod tracker;
mod types;

#[cfg(test)]
mod tests;

pub use tracker::PresenceTracker;
pub use types::{PeerState, PresenceRecord};
