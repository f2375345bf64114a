//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod sections;


use crate::schema::HeartlineConfig;
use heartline_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &HeartlineConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_realtime(&mut errors, config);
    sections::validate_roles(&mut errors, config);
    sections::validate_channels(&mut errors, config);
    sections::validate_counter(&mut errors, config);
    sections::validate_sync(&mut errors, config);
    sections::validate_display(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
