//! Terminal output for session updates and the status screen.

use std::io::Write;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use heartline_config::RolesConfig;
use heartline_sync::display::{days_together, eased_count, hours_together, recently_received};
use heartline_sync::{PeerState, Role, SessionUpdate, SyncEffect, SyncView};

/// Display names for the two roles.
#[derive(Debug, Clone)]
pub struct Labels {
    a: String,
    b: String,
}

impl Labels {
    pub fn from_config(roles: &RolesConfig) -> Self {
        Self {
            a: roles.a_label.clone(),
            b: roles.b_label.clone(),
        }
    }

    pub fn of(&self, role: Role) -> &str {
        match role {
            Role::A => &self.a,
            Role::B => &self.b,
            Role::Guest => "a guest",
        }
    }
}

pub fn update_line(update: &SessionUpdate, labels: &Labels, prefix: &str) -> String {
    let text = match update {
        SessionUpdate::Connection(true) => "connected".to_string(),
        SessionUpdate::Connection(false) => "connection lost".to_string(),
        SessionUpdate::Peer(PeerState {
            peer_online: false, ..
        }) => "waiting for partner".to_string(),
        SessionUpdate::Peer(PeerState {
            peer_active: true, ..
        }) => "partner is holding the heart".to_string(),
        SessionUpdate::Peer(_) => "partner is here".to_string(),
        SessionUpdate::PulseReceived(pulse) => {
            let who = labels.of(pulse.sender_role);
            match &pulse.payload {
                Some(message) => format!("<3 {who} is thinking of you: {message}"),
                None => format!("<3 {who} is thinking of you"),
            }
        }
        SessionUpdate::Effect(SyncEffect::Celebrate) => "*** in sync ***".to_string(),
        SessionUpdate::Effect(SyncEffect::Haptic(pattern)) => format!("(bzz {pattern:?})"),
        SessionUpdate::Effect(SyncEffect::SyncLost) => "sync lost".to_string(),
    };
    format!("{prefix}{text}")
}

pub fn print_updates(updates: &[SessionUpdate], labels: &Labels, prefix: &str) {
    for update in updates {
        println!("{}", update_line(update, labels, prefix));
    }
}

pub fn status_lines(view: &SyncView, role: Role, labels: &Labels) -> Vec<String> {
    let mut lines = vec![
        format!("you: {} ({})", labels.of(role), role),
        format!("link: {}", view.link_status().label()),
        format!(
            "heart: you {} / partner {}",
            if view.local_active { "holding" } else { "idle" },
            if view.remote_active { "holding" } else { "idle" },
        ),
        format!(
            "synced: {}{}",
            view.synced,
            if view.sync_achieved { " (achieved)" } else { "" }
        ),
        format!(
            "pulses: {} {} / {} {}",
            labels.of(Role::A),
            view.counts.count_a,
            labels.of(Role::B),
            view.counts.count_b
        ),
    ];
    let last = if recently_received(view.last_pulse_received, Utc::now()) {
        "just now".to_string()
    } else {
        match view.last_pulse_received {
            Some(at) => at.format("%H:%M:%S").to_string(),
            None => "waiting...".to_string(),
        }
    };
    lines.push(format!("last pulse: {last}"));
    lines
}

/// Count the anniversary up on one line, easing towards the total.
pub async fn count_up_days(since: NaiveDate, duration: Duration) {
    let now = Utc::now();
    let days = days_together(since, now).max(0) as u64;
    let hours = hours_together(since, now).max(0) as u64;
    let start = Instant::now();
    let mut frame = tokio::time::interval(Duration::from_millis(50));
    loop {
        frame.tick().await;
        let elapsed = start.elapsed();
        print!(
            "\rtogether: {} days, {} hours",
            eased_count(days, elapsed, duration),
            eased_count(hours, elapsed, duration)
        );
        let _ = std::io::stdout().flush();
        if elapsed >= duration {
            break;
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartline_sync::{Counter, PulseEvent, SyncPhase};

    fn labels() -> Labels {
        Labels::from_config(&RolesConfig::default())
    }

    #[test]
    fn pulse_line_names_sender() {
        let pulse = PulseEvent::new(Role::A, Some("hi".into()));
        let line = update_line(&SessionUpdate::PulseReceived(pulse), &labels(), "");
        assert_eq!(line, "<3 Her is thinking of you: hi");
    }

    #[test]
    fn peer_lines() {
        let offline = SessionUpdate::Peer(PeerState::OFFLINE);
        assert_eq!(
            update_line(&offline, &labels(), "[partner] "),
            "[partner] waiting for partner"
        );
        let holding = SessionUpdate::Peer(PeerState {
            peer_online: true,
            peer_active: true,
        });
        assert_eq!(
            update_line(&holding, &labels(), ""),
            "partner is holding the heart"
        );
    }

    #[test]
    fn status_shows_counts_with_labels() {
        let view = SyncView {
            connected: true,
            peer_online: true,
            peer_active: false,
            local_active: true,
            remote_active: false,
            synced: false,
            sync_achieved: false,
            phase: SyncPhase::LocalOnly,
            counts: Counter::new(3, 5),
            last_pulse_received: None,
        };
        let lines = status_lines(&view, Role::B, &labels());
        assert_eq!(lines[0], "you: Him (B)");
        assert_eq!(lines[1], "link: Partner is here");
        assert!(lines.contains(&"pulses: Her 3 / Him 5".to_string()));
        assert_eq!(lines.last().unwrap(), "last pulse: waiting...");
    }
}
