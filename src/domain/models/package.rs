use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub title: String,
    /// Display string, e.g. "120 €".
    pub price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
