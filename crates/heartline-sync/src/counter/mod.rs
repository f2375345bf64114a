//! Durable per-role pulse counter.
//!
//! One shared record holds a count for each named role. Each pulse sent
//! increments the sender's count by reading the record, adding one, and
//! writing the new value back. Stores never lower a stored count, but two
//! clients incrementing the same role at once can still lose an update.

mod memory;
mod rest;


use async_trait::async_trait;
use heartline_common::{StoreError, SyncError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::role::Role;

pub use memory::MemoryCounterStore;
pub use rest::RestCounterStore;

/// Snapshot of the shared counter record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub count_a: u64,
    pub count_b: u64,
}

impl Counter {
    pub fn new(count_a: u64, count_b: u64) -> Self {
        Self { count_a, count_b }
    }

    /// Count for `role`. Guests own no count.
    pub fn get(&self, role: Role) -> u64 {
        match role {
            Role::A => self.count_a,
            Role::B => self.count_b,
            Role::Guest => 0,
        }
    }

    /// This counter with one more pulse for `role`.
    pub fn incremented(mut self, role: Role) -> Self {
        match role {
            Role::A => self.count_a = self.count_a.saturating_add(1),
            Role::B => self.count_b = self.count_b.saturating_add(1),
            Role::Guest => {}
        }
        self
    }

    /// Field-wise maximum of two snapshots.
    pub fn merge_max(self, other: Counter) -> Self {
        Self {
            count_a: self.count_a.max(other.count_a),
            count_b: self.count_b.max(other.count_b),
        }
    }

    pub fn total(&self) -> u64 {
        self.count_a.saturating_add(self.count_b)
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_a: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_b: Option<u64>,
}

impl CounterPatch {
    /// Patch that sets only `role`'s count. `None` for guests.
    pub fn for_role(role: Role, value: u64) -> Option<Self> {
        match role {
            Role::A => Some(Self {
                count_a: Some(value),
                count_b: None,
            }),
            Role::B => Some(Self {
                count_a: None,
                count_b: Some(value),
            }),
            Role::Guest => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count_a.is_none() && self.count_b.is_none()
    }
}

/// Persistence for the counter record.
///
/// `set` must be monotonic: a value lower than the stored one is ignored.
/// There are no transactions spanning `get` and `set`.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn get(&self) -> Result<Counter, StoreError>;

    async fn set(&self, patch: CounterPatch) -> Result<(), StoreError>;
}

/// Read-modify-write one pulse for `role`. Returns the counter as written.
pub async fn increment(store: &dyn CounterStore, role: Role) -> Result<Counter, SyncError> {
    let unauthorized = || SyncError::Unauthorized {
        role: role.to_string(),
        action: "increment the counter",
    };
    if !role.is_participant() {
        return Err(unauthorized());
    }
    let current = store.get().await?;
    let next = current.incremented(role);
    let patch = CounterPatch::for_role(role, next.get(role)).ok_or_else(unauthorized)?;
    store.set(patch).await?;
    debug!(role = %role, count = next.get(role), "Counter incremented");
    Ok(next)
}
