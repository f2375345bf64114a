//! Durable pulse counter settings.

use serde::{Deserialize, Serialize};

/// Where the pulse counter lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterBackend {
    /// In-process only; resets when the program exits.
    #[default]
    Memory,
    /// A single row in a Supabase (PostgREST) table.
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub backend: CounterBackend,
    /// Table holding the counter row.
    pub table: String,
    /// Primary key of the counter row.
    pub row_id: i64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            backend: CounterBackend::Memory,
            table: "love_clicks".into(),
            row_id: 1,
        }
    }
}
