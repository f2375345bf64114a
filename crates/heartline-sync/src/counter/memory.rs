use async_trait::async_trait;
use heartline_common::StoreError;
use tokio::sync::RwLock;

use super::{Counter, CounterPatch, CounterStore};

/// In-process counter. Lives as long as the program.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counter: RwLock<Counter>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counts(count_a: u64, count_b: u64) -> Self {
        Self {
            counter: RwLock::new(Counter::new(count_a, count_b)),
        }
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self) -> Result<Counter, StoreError> {
        Ok(*self.counter.read().await)
    }

    async fn set(&self, patch: CounterPatch) -> Result<(), StoreError> {
        let mut counter = self.counter.write().await;
        if let Some(a) = patch.count_a {
            counter.count_a = counter.count_a.max(a);
        }
        if let Some(b) = patch.count_b {
            counter.count_b = counter.count_b.max(b);
        }
        Ok(())
    }
}
