//! The two-input sync state machine.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    LocalOnly,
    RemoteOnly,
    BothActive,
}

impl SyncPhase {
    pub fn of(local_active: bool, remote_active: bool) -> Self {
        match (local_active, remote_active) {
            (false, false) => SyncPhase::Idle,
            (true, false) => SyncPhase::LocalOnly,
            (false, true) => SyncPhase::RemoteOnly,
            (true, true) => SyncPhase::BothActive,
        }
    }
}

/// Something the front-end should do in response to a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEffect {
    Celebrate,
    /// Vibration pattern, alternating on/off milliseconds.
    Haptic(Vec<u64>),
    SyncLost,
}

/// `synced` is derived from the two inputs. `sync_achieved` latches on
/// the first entry into `BothActive` and clears only in `Idle`.
#[derive(Debug, Clone)]
pub struct SyncState {
    local_active: bool,
    remote_active: bool,
    sync_achieved: bool,
    haptic_pattern: Vec<u64>,
}

impl SyncState {
    pub fn new(haptic_pattern: Vec<u64>) -> Self {
        Self {
            local_active: false,
            remote_active: false,
            sync_achieved: false,
            haptic_pattern,
        }
    }

    pub fn local_active(&self) -> bool {
        self.local_active
    }

    pub fn remote_active(&self) -> bool {
        self.remote_active
    }

    pub fn phase(&self) -> SyncPhase {
        SyncPhase::of(self.local_active, self.remote_active)
    }

    pub fn synced(&self) -> bool {
        self.local_active && self.remote_active
    }

    pub fn sync_achieved(&self) -> bool {
        self.sync_achieved
    }

    pub fn set_local(&mut self, active: bool) -> Vec<SyncEffect> {
        self.transition(active, self.remote_active)
    }

    pub fn set_remote(&mut self, active: bool) -> Vec<SyncEffect> {
        self.transition(self.local_active, active)
    }

    /// Back to `Idle`, as on disconnect.
    pub fn reset(&mut self) -> Vec<SyncEffect> {
        self.transition(false, false)
    }

    fn transition(&mut self, local_active: bool, remote_active: bool) -> Vec<SyncEffect> {
        let from = self.phase();
        self.local_active = local_active;
        self.remote_active = remote_active;
        let to = self.phase();

        let mut effects = Vec::new();
        if from == to {
            return effects;
        }
        if from == SyncPhase::BothActive {
            effects.push(SyncEffect::SyncLost);
        }
        match to {
            SyncPhase::BothActive if !self.sync_achieved => {
                self.sync_achieved = true;
                effects.push(SyncEffect::Celebrate);
                effects.push(SyncEffect::Haptic(self.haptic_pattern.clone()));
            }
            SyncPhase::Idle => self.sync_achieved = false,
            _ => {}
        }
        effects
    }
}
