//! Heartline configuration system.
//!
//! TOML-based configuration with validation. All sections use defaults
//! so partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    ChannelsConfig, CounterBackend, CounterConfig, DisplayConfig, HeartlineConfig, LoggingConfig,
    RealtimeConfig, RemoteSignalKind, RolesConfig, SyncConfig, CONFIG_SCHEMA_VERSION,
};

use std::path::Path;

use heartline_common::ConfigError;

/// Load config from the platform default path, creating it if absent.
pub fn load_config() -> Result<HeartlineConfig, ConfigError> {
    toml_loader::load_default()
}

/// Load config from `path` when given, otherwise from the default path.
pub fn load_config_from(path: Option<&Path>) -> Result<HeartlineConfig, ConfigError> {
    match path {
        Some(p) => toml_loader::load_from_path(p),
        None => load_config(),
    }
}
