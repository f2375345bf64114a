//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Heartline Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[realtime]
# project_ref = ""           # <ref>.supabase.co
# api_key = ""               # anon (publishable) key
# heartbeat_interval = 25    # 5-60 seconds
# reconnect_delay = 1        # 1-60 seconds
# max_reconnect_delay = 30   # >= reconnect_delay

[roles]
# a = ""                     # login identity resolved to role A
# b = ""                     # login identity resolved to role B
# a_label = "Her"
# b_label = "Him"

[channels]
# presence_topic = "heartbeat-room"
# pulse_topic = "love_room"

[counter]
# backend = "memory"         # "memory" or "rest"
# table = "love_clicks"
# row_id = 1

[sync]
# remote_signal = "presence" # "presence" or "pulse"
# pulse_hold_ms = 2000       # 100-60000
# haptic_pattern = [100, 50, 100, 50, 200]

[display]
# together_since = "2022-12-11"  # anniversary date, YYYY-MM-DD
# count_up_ms = 2000             # counter animation length

[logging]
# level = "heartline=info"
"##
    .to_string()
}
