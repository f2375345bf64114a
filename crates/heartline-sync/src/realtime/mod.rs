//! Thin Supabase Realtime client over Phoenix Channels v1 protocol.
//!
//! `RealtimeClient` speaks the wire protocol over `tokio-tungstenite`
//! (heartbeats, join/leave, broadcast, presence track/untrack,
//! auto-reconnect with backoff). `LoopbackHub` implements the same
//! `RealtimeTransport` seam in memory.

mod client;
mod connection;
mod handler;
mod loopback;
mod transport;
mod types;

pub use client::RealtimeClient;
pub use loopback::{LoopbackClient, LoopbackHub};
pub use transport::RealtimeTransport;
pub use types::{
    BroadcastConfig, ChannelConfig, PhoenixMessage, PresenceKey, PresenceMap, RealtimeConfig,
    RealtimeEvent,
};
