use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Anniversary the "days together" counter starts from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub together_since: Option<NaiveDate>,
    /// Length of the count-up animation in milliseconds.
    pub count_up_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            together_since: None,
            count_up_ms: 2000,
        }
    }
}
