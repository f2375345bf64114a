//! Public handle for interacting with the Supabase Realtime connection.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use super::connection::connection_loop;
use super::transport::RealtimeTransport;
use super::types::{ChannelConfig, RealtimeCommand, RealtimeConfig, RealtimeEvent};

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle for interacting with the Supabase Realtime connection.
///
/// All methods are non-blocking and send commands to the background
/// connection task.
pub struct RealtimeClient {
    command_tx: mpsc::Sender<RealtimeCommand>,
    connected: Arc<RwLock<bool>>,
}

impl RealtimeClient {
    /// Create a new client and start the background connection.
    /// Returns `(client, event_receiver)`.
    pub fn connect(config: RealtimeConfig) -> (Self, mpsc::Receiver<RealtimeEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);
        let connected = Arc::new(RwLock::new(false));

        let client = Self {
            command_tx,
            connected: Arc::clone(&connected),
        };

        tokio::spawn(connection_loop(config, connected, event_tx, command_rx));

        (client, event_rx)
    }

    /// Check if the WebSocket is currently up.
    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    async fn command(&self, cmd: RealtimeCommand) {
        if self.command_tx.send(cmd).await.is_err() {
            tracing::debug!("Realtime connection task has stopped; command dropped");
        }
    }
}

#[async_trait]
impl RealtimeTransport for RealtimeClient {
    async fn join_channel(&self, topic: &str, config: ChannelConfig) {
        self.command(RealtimeCommand::JoinChannel {
            topic: topic.to_string(),
            config,
        })
        .await;
    }

    async fn leave_channel(&self, topic: &str) {
        self.command(RealtimeCommand::LeaveChannel {
            topic: topic.to_string(),
        })
        .await;
    }

    async fn broadcast(&self, topic: &str, event: &str, payload: serde_json::Value) {
        self.command(RealtimeCommand::Broadcast {
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
        })
        .await;
    }

    async fn presence_track(&self, topic: &str, payload: serde_json::Value) {
        self.command(RealtimeCommand::PresenceTrack {
            topic: topic.to_string(),
            payload,
        })
        .await;
    }

    async fn presence_untrack(&self, topic: &str) {
        self.command(RealtimeCommand::PresenceUntrack {
            topic: topic.to_string(),
        })
        .await;
    }

    async fn disconnect(&self) {
        self.command(RealtimeCommand::Disconnect).await;
    }
}
