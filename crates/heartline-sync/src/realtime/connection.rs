//! Background WebSocket connection loop with auto-reconnect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use super::handler::decode_frame;
use super::types::{ChannelConfig, PhoenixMessage, RealtimeCommand, RealtimeConfig, RealtimeEvent};

// ---------------------------------------------------------------------------
// Ref Counter
// ---------------------------------------------------------------------------

/// Monotonically increasing ref counter for Phoenix messages.
static REF_COUNTER: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_ref() -> String {
    REF_COUNTER.fetch_add(1, Ordering::Relaxed).to_string()
}

// ---------------------------------------------------------------------------
// Shared State
// ---------------------------------------------------------------------------

/// A channel to rejoin (and re-track) after a reconnect.
#[derive(Clone)]
pub(crate) struct PendingChannel {
    pub(crate) config: ChannelConfig,
    pub(crate) presence_payload: Option<serde_json::Value>,
}

/// State shared between the reader and the command forwarder.
#[derive(Clone)]
struct Shared {
    channels: Arc<RwLock<HashMap<String, PendingChannel>>>,
    /// Outstanding `phx_join` refs -> topic.
    join_refs: Arc<Mutex<HashMap<String, String>>>,
    shutdown: Arc<AtomicBool>,
}

/// Serialize and write one frame. Returns false if the socket is gone.
async fn send_frame<S>(writer: &Arc<Mutex<S>>, msg: &PhoenixMessage) -> bool
where
    S: Sink<WsMessage> + Unpin,
{
    let Ok(json) = serde_json::to_string(msg) else {
        return true;
    };
    let mut writer = writer.lock().await;
    writer.send(WsMessage::Text(json.into())).await.is_ok()
}

/// Send `phx_join` for `topic`, remembering the ref so the reply can be matched.
async fn send_join<S>(writer: &Arc<Mutex<S>>, shared: &Shared, topic: &str, config: &ChannelConfig)
where
    S: Sink<WsMessage> + Unpin,
{
    let msg_ref = next_ref();
    shared
        .join_refs
        .lock()
        .await
        .insert(msg_ref.clone(), topic.to_string());
    let msg = PhoenixMessage::on_topic(topic, "phx_join", config.to_join_payload(), msg_ref);
    send_frame(writer, &msg).await;
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

/// Background task managing the WebSocket connection with auto-reconnect.
///
/// Exits after an explicit `Disconnect` command or once every client
/// handle has been dropped.
pub(crate) async fn connection_loop(
    config: RealtimeConfig,
    connected: Arc<RwLock<bool>>,
    event_tx: mpsc::Sender<RealtimeEvent>,
    command_rx: mpsc::Receiver<RealtimeCommand>,
) {
    let command_rx = Arc::new(Mutex::new(command_rx));
    let shared = Shared {
        channels: Arc::new(RwLock::new(HashMap::new())),
        join_refs: Arc::new(Mutex::new(HashMap::new())),
        shutdown: Arc::new(AtomicBool::new(false)),
    };
    let mut reconnect_delay = config.reconnect_delay_secs.max(1);

    while !shared.shutdown.load(Ordering::Relaxed) {
        let url = config.ws_url();
        info!(url = %url.split('?').next().unwrap_or(""), "Connecting to Supabase Realtime");

        match tokio::time::timeout(Duration::from_secs(15), tokio_tungstenite::connect_async(&url)).await {
            Ok(Ok((ws_stream, _))) => {
                reconnect_delay = config.reconnect_delay_secs.max(1);
                *connected.write().await = true;
                let _ = event_tx.send(RealtimeEvent::Connected).await;

                let (ws_write, mut ws_read) = ws_stream.split();
                let ws_write = Arc::new(Mutex::new(ws_write));

                // Rejoin channels and restore tracked presence.
                shared.join_refs.lock().await.clear();
                let channels: Vec<(String, PendingChannel)> = shared
                    .channels
                    .read()
                    .await
                    .iter()
                    .map(|(t, c)| (t.clone(), c.clone()))
                    .collect();
                for (topic, pending) in &channels {
                    send_join(&ws_write, &shared, topic, &pending.config).await;
                    if let Some(payload) = &pending.presence_payload {
                        let cmd = RealtimeCommand::PresenceTrack {
                            topic: topic.clone(),
                            payload: payload.clone(),
                        };
                        if let Some(msg) = cmd.to_frame(next_ref()) {
                            send_frame(&ws_write, &msg).await;
                        }
                    }
                }

                let heartbeat_handle = tokio::spawn(heartbeat_task(
                    Arc::clone(&ws_write),
                    config.heartbeat_interval_secs,
                ));
                let cmd_handle = tokio::spawn(command_forwarder(
                    Arc::clone(&command_rx),
                    Arc::clone(&ws_write),
                    shared.clone(),
                ));

                while let Some(msg_result) = ws_read.next().await {
                    match msg_result {
                        Ok(WsMessage::Text(text)) => {
                            let Ok(frame) = serde_json::from_str::<PhoenixMessage>(&text) else {
                                debug!(text = %text, "Unrecognized message from Supabase");
                                continue;
                            };
                            let join_topic = match &frame.msg_ref {
                                Some(r) if frame.event == "phx_reply" => {
                                    shared.join_refs.lock().await.remove(r)
                                }
                                _ => None,
                            };
                            if let Some(event) = decode_frame(&frame, join_topic.as_deref()) {
                                let _ = event_tx.send(event).await;
                            }
                        }
                        Ok(WsMessage::Close(_)) => {
                            info!("Supabase Realtime closed connection");
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                        _ => {}
                    }
                }

                heartbeat_handle.abort();
                cmd_handle.abort();
                *connected.write().await = false;
                let _ = event_tx.send(RealtimeEvent::Disconnected).await;
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to connect to Supabase Realtime");
                let _ = event_tx
                    .send(RealtimeEvent::Error(format!("Connection failed: {e}")))
                    .await;
            }
            Err(_elapsed) => {
                error!("WebSocket connection timed out after 15s");
                let _ = event_tx
                    .send(RealtimeEvent::Error("Connection timed out after 15s".to_string()))
                    .await;
            }
        }

        if shared.shutdown.load(Ordering::Relaxed) {
            break;
        }

        info!(delay = reconnect_delay, "Reconnecting in {} seconds", reconnect_delay);
        tokio::time::sleep(Duration::from_secs(reconnect_delay)).await;
        reconnect_delay = config.next_delay(reconnect_delay);
    }

    info!("Realtime connection loop stopped");
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

async fn heartbeat_task<S>(ws_write: Arc<Mutex<S>>, interval_secs: u64)
where
    S: Sink<WsMessage> + Unpin,
{
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        interval.tick().await;
        let msg = PhoenixMessage {
            topic: "phoenix".to_string(),
            event: "heartbeat".to_string(),
            payload: serde_json::json!({}),
            msg_ref: Some(next_ref()),
        };
        if !send_frame(&ws_write, &msg).await {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Command Forwarder
// ---------------------------------------------------------------------------

async fn command_forwarder<S>(
    cmd_rx: Arc<Mutex<mpsc::Receiver<RealtimeCommand>>>,
    ws_write: Arc<Mutex<S>>,
    shared: Shared,
) where
    S: Sink<WsMessage> + Unpin,
{
    let mut rx = cmd_rx.lock().await;
    loop {
        let Some(cmd) = rx.recv().await else {
            // Every client handle dropped.
            shared.shutdown.store(true, Ordering::Relaxed);
            let _ = ws_write.lock().await.send(WsMessage::Close(None)).await;
            return;
        };

        match &cmd {
            RealtimeCommand::JoinChannel { topic, config } => {
                send_join(&ws_write, &shared, topic, config).await;
                shared.channels.write().await.insert(
                    topic.clone(),
                    PendingChannel {
                        config: config.clone(),
                        presence_payload: None,
                    },
                );
                continue;
            }
            RealtimeCommand::LeaveChannel { topic } => {
                shared.channels.write().await.remove(topic);
            }
            RealtimeCommand::PresenceTrack { topic, payload } => {
                if let Some(ch) = shared.channels.write().await.get_mut(topic) {
                    ch.presence_payload = Some(payload.clone());
                }
            }
            RealtimeCommand::PresenceUntrack { topic } => {
                if let Some(ch) = shared.channels.write().await.get_mut(topic) {
                    ch.presence_payload = None;
                }
            }
            RealtimeCommand::Broadcast { .. } => {}
            RealtimeCommand::Disconnect => {
                shared.shutdown.store(true, Ordering::Relaxed);
                let topics: Vec<String> = shared.channels.write().await.drain().map(|(t, _)| t).collect();
                for topic in topics {
                    let leave = RealtimeCommand::LeaveChannel { topic };
                    if let Some(msg) = leave.to_frame(next_ref()) {
                        send_frame(&ws_write, &msg).await;
                    }
                }
                let _ = ws_write.lock().await.send(WsMessage::Close(None)).await;
                return;
            }
        }

        if let Some(msg) = cmd.to_frame(next_ref()) {
            send_frame(&ws_write, &msg).await;
        }
    }
}
