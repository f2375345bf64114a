use serde::{Deserialize, Serialize};

/// The two identities allowed to act, plus their display labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Authenticated identity (login email) that resolves to role A.
    pub a: String,
    /// Authenticated identity that resolves to role B.
    pub b: String,
    pub a_label: String,
    pub b_label: String,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            a: String::new(),
            b: String::new(),
            a_label: "Her".into(),
            b_label: "Him".into(),
        }
    }
}
