//! Wires config, store, and transport into a session and runs the
//! terminal loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use heartline_common::{ConfigError, HeartlineError, SyncError};
use heartline_config::{CounterBackend, HeartlineConfig, RemoteSignalKind};
use heartline_sync::{
    CounterStore, LoopbackHub, MemoryCounterStore, Participant, RealtimeClient, RealtimeConfig,
    RealtimeEvent, RealtimeTransport, RemoteSignal, RestCounterStore, Role, RoleResolver,
    SessionConfig, SessionUpdate, SyncSession,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::Args;
use crate::commands::{Action, Command, HELP};
use crate::render::{self, Labels};

const TICK: Duration = Duration::from_millis(250);

pub fn session_config(config: &HeartlineConfig) -> SessionConfig {
    let remote_signal = match config.sync.remote_signal {
        RemoteSignalKind::Presence => RemoteSignal::Presence,
        RemoteSignalKind::Pulse => RemoteSignal::Pulse {
            hold: Duration::from_millis(config.sync.pulse_hold_ms),
        },
    };
    SessionConfig {
        presence_topic: config.channels.presence_topic.clone(),
        pulse_topic: config.channels.pulse_topic.clone(),
        remote_signal,
        haptic_pattern: config.sync.haptic_pattern.clone(),
    }
}

fn realtime_config(config: &HeartlineConfig) -> RealtimeConfig {
    let rt = &config.realtime;
    RealtimeConfig {
        project_ref: rt.project_ref.clone(),
        api_key: rt.api_key.clone(),
        heartbeat_interval_secs: rt.heartbeat_interval,
        reconnect_delay_secs: rt.reconnect_delay,
        max_reconnect_delay_secs: rt.max_reconnect_delay,
    }
}

fn build_store(config: &HeartlineConfig) -> Result<Arc<dyn CounterStore>, HeartlineError> {
    let store: Arc<dyn CounterStore> = match config.counter.backend {
        CounterBackend::Memory => Arc::new(MemoryCounterStore::new()),
        CounterBackend::Rest => Arc::new(RestCounterStore::new(
            &config.realtime.project_ref,
            &config.realtime.api_key,
            &config.counter.table,
            config.counter.row_id,
        )?),
    };
    info!(backend = ?config.counter.backend, "Counter store ready");
    Ok(store)
}

/// A session plus the event stream feeding it.
struct Seat {
    session: SyncSession,
    events: mpsc::Receiver<RealtimeEvent>,
}

impl Seat {
    async fn open(
        participant: Participant,
        config: SessionConfig,
        transport: Arc<dyn RealtimeTransport>,
        events: mpsc::Receiver<RealtimeEvent>,
        store: Arc<dyn CounterStore>,
    ) -> Result<Self, SyncError> {
        let mut session = SyncSession::new(participant, config, transport, store);
        session.connect().await?;
        Ok(Self { session, events })
    }

    async fn act(&mut self, action: Action, labels: &Labels, prefix: &str) {
        let updates = match action {
            Action::Hold => self.session.set_local_active(true).await,
            Action::Release => self.session.set_local_active(false).await,
            Action::Pulse(message) => match self.session.send_pulse(message).await {
                Ok(_) => {
                    println!("{prefix}pulse sent");
                    Vec::new()
                }
                Err(e) => {
                    println!("{prefix}{e}");
                    Vec::new()
                }
            },
        };
        render::print_updates(&updates, labels, prefix);
    }
}

async fn next_event(seat: &mut Option<Seat>) -> Option<RealtimeEvent> {
    match seat {
        Some(seat) => seat.events.recv().await,
        None => std::future::pending().await,
    }
}

pub async fn run(args: Args, config: HeartlineConfig) -> Result<(), HeartlineError> {
    let resolver = RoleResolver::new(&config.roles.a, &config.roles.b);
    let participant = resolver.participant(args.identity.as_deref());
    let role = participant.role();
    let labels = Labels::from_config(&config.roles);
    info!(id = %participant.id(), role = %role, "Participant resolved");
    if role == Role::Guest {
        println!("signed in as a guest: you can watch but not send pulses");
    }

    let store = build_store(&config)?;
    let session_config = session_config(&config);

    let (mut me, mut partner) = if args.loopback {
        let hub = LoopbackHub::new();
        let (link, events) = hub.connect();
        let me = Seat::open(
            participant,
            session_config.clone(),
            Arc::new(link),
            events,
            Arc::clone(&store),
        )
        .await?;
        let partner_role = role.counterpart().unwrap_or(Role::B);
        let (partner_link, partner_events) = hub.connect();
        let partner = Seat::open(
            Participant::new(partner_role),
            session_config,
            Arc::new(partner_link),
            partner_events,
            Arc::clone(&store),
        )
        .await?;
        info!(partner = %partner_role, "Running against loopback hub");
        (me, Some(partner))
    } else {
        if !config.realtime.is_configured() {
            return Err(ConfigError::ValidationError(
                "realtime.project_ref and realtime.api_key must be set (or pass --loopback)".into(),
            )
            .into());
        }
        let (client, events) = RealtimeClient::connect(realtime_config(&config));
        let me = Seat::open(participant, session_config, Arc::new(client), events, store).await?;
        (me, None)
    };

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Me(action)) => me.act(action, &labels, "").await,
                    Ok(Command::Partner(action)) => match partner.as_mut() {
                        Some(p) => p.act(action, &labels, "[partner] ").await,
                        None => println!("no simulated partner (run with --loopback)"),
                    },
                    Ok(Command::Status) => {
                        for line in render::status_lines(&me.session.view(), role, &labels) {
                            println!("  {line}");
                        }
                        if let Some(since) = config.display.together_since {
                            let duration = Duration::from_millis(config.display.count_up_ms);
                            render::count_up_days(since, duration).await;
                        }
                    }
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::Quit) => break,
                    Err(e) => println!("{e}"),
                }
            }
            Some(event) = me.events.recv() => {
                let updates = me.session.handle_event(event).await;
                render::print_updates(&updates, &labels, "");
            }
            Some(event) = next_event(&mut partner) => {
                if let Some(p) = partner.as_mut() {
                    // Only the pulses the partner receives are shown.
                    let updates: Vec<SessionUpdate> = p
                        .session
                        .handle_event(event)
                        .await
                        .into_iter()
                        .filter(|u| matches!(u, SessionUpdate::PulseReceived(_)))
                        .collect();
                    render::print_updates(&updates, &labels, "[partner] ");
                }
            }
            _ = ticker.tick() => {
                let updates = me.session.tick(Instant::now());
                render::print_updates(&updates, &labels, "");
                if let Some(p) = partner.as_mut() {
                    p.session.tick(Instant::now());
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let updates = me.session.disconnect().await;
    render::print_updates(&updates, &labels, "");
    if let Some(mut p) = partner {
        p.session.disconnect().await;
    }
    info!("Session closed");
    Ok(())
}
