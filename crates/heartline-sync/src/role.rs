//! Role resolution: who is allowed to act in a session.

use std::fmt;
use std::str::FromStr;

use heartline_common::{ParticipantId, ProtocolError};
use serde::{Deserialize, Serialize};

/// Fixed identity category, assigned once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "guest")]
    Guest,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::A => "A",
            Role::B => "B",
            Role::Guest => "guest",
        }
    }

    /// Whether this role may emit pulses and own a counter.
    pub fn is_participant(self) -> bool {
        !matches!(self, Role::Guest)
    }

    /// The other named role. Guests have none.
    pub fn counterpart(self) -> Option<Role> {
        match self {
            Role::A => Some(Role::B),
            Role::B => Some(Role::A),
            Role::Guest => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Role::A),
            "B" | "b" => Ok(Role::B),
            g if g.eq_ignore_ascii_case("guest") => Ok(Role::Guest),
            other => Err(ProtocolError::UnknownRole(other.to_string())),
        }
    }
}

/// A connected client: a fresh presence key plus its resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    id: ParticipantId,
    role: Role,
}

impl Participant {
    pub fn new(role: Role) -> Self {
        Self {
            id: ParticipantId::new(),
            role,
        }
    }

    pub fn with_id(id: ParticipantId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Maps an authenticated identity to a role.
///
/// Identities are compared case-insensitively after trimming. An empty
/// configured identity never matches anything.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    a: String,
    b: String,
}

fn normalize(identity: &str) -> String {
    identity.trim().to_lowercase()
}

impl RoleResolver {
    pub fn new(a: &str, b: &str) -> Self {
        Self {
            a: normalize(a),
            b: normalize(b),
        }
    }

    pub fn resolve(&self, identity: Option<&str>) -> Role {
        let Some(identity) = identity.map(normalize).filter(|i| !i.is_empty()) else {
            return Role::Guest;
        };
        if identity == self.a {
            Role::A
        } else if identity == self.b {
            Role::B
        } else {
            Role::Guest
        }
    }

    /// Resolve and mint a participant for a new session.
    pub fn participant(&self, identity: Option<&str>) -> Participant {
        Participant::new(self.resolve(identity))
    }
}
