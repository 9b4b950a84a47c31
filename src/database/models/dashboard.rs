use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Monthly snapshot of survey aggregates, keyed by period ("YYYY-MM").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: i64,
    pub period: String,
    pub total_responses: i64,
    pub average_recommendation_score: f64,
    pub gender_identity_distribution: Option<Value>,
    pub age_range_distribution: Option<Value>,
    pub event_type_distribution: Option<Value>,
    pub transport_type_distribution: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Dashboard {
    pub fn apply(&mut self, changes: &DashboardChanges) {
        if let Some(period) = &changes.period {
            self.period = period.clone();
        }
        if let Some(total) = changes.total_responses {
            self.total_responses = total;
        }
        if let Some(average) = changes.average_recommendation_score {
            self.average_recommendation_score = average;
        }
        if changes.gender_identity_distribution.is_some() {
            self.gender_identity_distribution = changes.gender_identity_distribution.clone();
        }
        if changes.age_range_distribution.is_some() {
            self.age_range_distribution = changes.age_range_distribution.clone();
        }
        if changes.event_type_distribution.is_some() {
            self.event_type_distribution = changes.event_type_distribution.clone();
        }
        if changes.transport_type_distribution.is_some() {
            self.transport_type_distribution = changes.transport_type_distribution.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDashboard {
    pub period: String,
    #[serde(default)]
    pub total_responses: i64,
    #[serde(default)]
    pub average_recommendation_score: f64,
    pub gender_identity_distribution: Option<Value>,
    pub age_range_distribution: Option<Value>,
    pub event_type_distribution: Option<Value>,
    pub transport_type_distribution: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardChanges {
    pub period: Option<String>,
    pub total_responses: Option<i64>,
    pub average_recommendation_score: Option<f64>,
    pub gender_identity_distribution: Option<Value>,
    pub age_range_distribution: Option<Value>,
    pub event_type_distribution: Option<Value>,
    pub transport_type_distribution: Option<Value>,
}
