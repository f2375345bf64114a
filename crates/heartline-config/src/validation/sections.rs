//! Per-section validators.

use crate::schema::{CounterBackend, HeartlineConfig};

use super::helpers::{validate_non_empty, validate_range};

pub(crate) fn validate_realtime(errors: &mut Vec<String>, config: &HeartlineConfig) {
    let rt = &config.realtime;
    validate_range(errors, "realtime.heartbeat_interval", rt.heartbeat_interval, 5, 60);
    validate_range(errors, "realtime.reconnect_delay", rt.reconnect_delay, 1, 60);
    if rt.max_reconnect_delay < rt.reconnect_delay {
        errors.push(format!(
            "realtime.max_reconnect_delay = {} is below reconnect_delay = {}",
            rt.max_reconnect_delay, rt.reconnect_delay
        ));
    }
}

pub(crate) fn validate_roles(errors: &mut Vec<String>, config: &HeartlineConfig) {
    let roles = &config.roles;
    validate_non_empty(errors, "roles.a", &roles.a);
    validate_non_empty(errors, "roles.b", &roles.b);
    if !roles.a.trim().is_empty() && roles.a.trim().eq_ignore_ascii_case(roles.b.trim()) {
        errors.push("roles.a and roles.b must be different identities".into());
    }
}

pub(crate) fn validate_channels(errors: &mut Vec<String>, config: &HeartlineConfig) {
    validate_non_empty(errors, "channels.presence_topic", &config.channels.presence_topic);
    validate_non_empty(errors, "channels.pulse_topic", &config.channels.pulse_topic);
    if config.channels.presence_topic.trim() == config.channels.pulse_topic.trim() {
        errors.push("channels.presence_topic and channels.pulse_topic must differ".into());
    }
}

pub(crate) fn validate_counter(errors: &mut Vec<String>, config: &HeartlineConfig) {
    if config.counter.backend == CounterBackend::Rest {
        validate_non_empty(errors, "counter.table", &config.counter.table);
        if !config.realtime.is_configured() {
            errors.push("counter.backend = \"rest\" needs realtime.project_ref and realtime.api_key".into());
        }
    }
}

pub(crate) fn validate_sync(errors: &mut Vec<String>, config: &HeartlineConfig) {
    validate_range(errors, "sync.pulse_hold_ms", config.sync.pulse_hold_ms, 100, 60_000);
    if config.sync.haptic_pattern.len() > 16 {
        errors.push("sync.haptic_pattern has more than 16 steps".into());
    }
    for (i, step) in config.sync.haptic_pattern.iter().enumerate() {
        validate_range(errors, &format!("sync.haptic_pattern[{i}]"), *step, 0, 5000);
    }
}

pub(crate) fn validate_display(errors: &mut Vec<String>, config: &HeartlineConfig) {
    validate_range(errors, "display.count_up_ms", config.display.count_up_ms, 0, 10_000);
}
