use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Anonymous answer to the preference poll: an ordered list of free-text choices.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSubmission {
    pub id: i64,
    pub preferences: Vec<String>,
    pub created_at: DateTime<Utc>,
}
