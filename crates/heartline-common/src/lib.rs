pub mod errors;
pub mod id;

pub use errors::{ConfigError, HeartlineError, ProtocolError, StoreError, SyncError};
pub use id::{new_id, new_pulse_id, ParticipantId};

pub type Result<T> = std::result::Result<T, HeartlineError>;
