use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// A payload that failed validation at the channel boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unexpected broadcast event: {0}")]
    UnexpectedEvent(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("counter record not found")]
    NotFound,

    #[error("store network error: {0}")]
    Network(String),

    #[error("store rejected request: {0}")]
    Rejected(String),

    #[error("store response parse error: {0}")]
    Parse(String),
}

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("{role} may not {action}")]
    Unauthorized { role: String, action: &'static str },

    #[error("session is not connected")]
    NotConnected,

    #[error("session was closed; open a new one")]
    Closed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum HeartlineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("roles.a is empty".into());
        assert_eq!(err.to_string(), "config validation error: roles.a is empty");
    }

    #[test]
    fn unauthorized_names_role_and_action() {
        let err = SyncError::Unauthorized {
            role: "guest".into(),
            action: "send a pulse",
        };
        assert_eq!(err.to_string(), "guest may not send a pulse");
    }

    #[test]
    fn sync_error_from_store() {
        let err: SyncError = StoreError::NotFound.into();
        assert!(matches!(err, SyncError::Store(StoreError::NotFound)));
        assert_eq!(err.to_string(), "counter record not found");
    }

    #[test]
    fn closed_session_message() {
        assert_eq!(
            SyncError::Closed.to_string(),
            "session was closed; open a new one"
        );
        let err: SyncError = ProtocolError::Malformed("bad json".into()).into();
        assert!(matches!(err, SyncError::Protocol(_)));
    }

    #[test]
    fn heartline_error_from_parts() {
        let err: HeartlineError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, HeartlineError::Config(_)));
        assert!(err.to_string().contains("bad toml"));

        let err: HeartlineError = ProtocolError::UnknownRole("C".into()).into();
        assert!(matches!(err, HeartlineError::Protocol(_)));
        assert_eq!(err.to_string(), "unknown role: C");

        let err: HeartlineError = StoreError::Network("timeout".into()).into();
        assert_eq!(err.to_string(), "store network error: timeout");

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "stdin closed");
        let err: HeartlineError = io_err.into();
        assert!(matches!(err, HeartlineError::Io(_)));
    }

    #[test]
    fn other_variant_is_bare_message() {
        let err = HeartlineError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
