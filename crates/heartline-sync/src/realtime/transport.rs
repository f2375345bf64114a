//! The seam between session logic and whatever carries realtime frames.

use async_trait::async_trait;

use super::types::ChannelConfig;

/// Commands a session issues to its realtime connection.
///
/// Every method is fire-and-forget: delivery failures are never reported
/// back, and a transport that is currently offline may drop or queue the
/// command. Incoming traffic arrives separately as `RealtimeEvent`s on the
/// receiver handed out when the transport was created.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn join_channel(&self, topic: &str, config: ChannelConfig);

    async fn leave_channel(&self, topic: &str);

    async fn broadcast(&self, topic: &str, event: &str, payload: serde_json::Value);

    async fn presence_track(&self, topic: &str, payload: serde_json::Value);

    async fn presence_untrack(&self, topic: &str);

    /// Leave every channel and stop reconnecting.
    async fn disconnect(&self);
}
