//! Configuration schema types for Heartline.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with defaults matching the deployed site.

mod channels;
mod counter;
mod display;
mod logging;
mod realtime;
mod roles;
mod sync;

pub use channels::*;
pub use counter::*;
pub use display::*;
pub use logging::*;
pub use realtime::*;
pub use roles::*;
pub use sync::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Heartline.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartlineConfig {
    pub realtime: RealtimeConfig,
    pub roles: RolesConfig,
    pub channels: ChannelsConfig,
    pub counter: CounterConfig,
    pub sync: SyncConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}
