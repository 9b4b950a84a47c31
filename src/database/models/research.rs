use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::answers::{AgeRange, Dimension, EventType, Findability, Frustration, GenderIdentity, Highlight, TransportType};

/// One survey response.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Research {
    pub id: i64,
    pub user_id: i64,
    pub gender_identity: Option<GenderIdentity>,
    pub age_range: Option<AgeRange>,
    pub event_type: Option<EventType>,
    pub transport_type: Option<TransportType>,
    pub recommendation_score: Option<i32>,
    pub gate_findability: Option<Findability>,
    pub highlight: Option<Highlight>,
    pub frustration: Option<Frustration>,
    pub next_vibe_score: Option<i32>,
    pub artist_wish: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Research {
    /// Wire name of the answer given for `dimension`, if any.
    pub fn answer(&self, dimension: Dimension) -> Option<&'static str> {
        match dimension {
            Dimension::GenderIdentity => self.gender_identity.map(|v| v.as_str()),
            Dimension::AgeRange => self.age_range.map(|v| v.as_str()),
            Dimension::EventType => self.event_type.map(|v| v.as_str()),
            Dimension::TransportType => self.transport_type.map(|v| v.as_str()),
            Dimension::GateFindability => self.gate_findability.map(|v| v.as_str()),
            Dimension::Highlight => self.highlight.map(|v| v.as_str()),
            Dimension::Frustration => self.frustration.map(|v| v.as_str()),
        }
    }

    pub fn apply(&mut self, changes: &ResearchChanges) {
        if let Some(user_id) = changes.user_id {
            self.user_id = user_id;
        }
        let answers = &changes.answers;
        if answers.gender_identity.is_some() {
            self.gender_identity = answers.gender_identity;
        }
        if answers.age_range.is_some() {
            self.age_range = answers.age_range;
        }
        if answers.event_type.is_some() {
            self.event_type = answers.event_type;
        }
        if answers.transport_type.is_some() {
            self.transport_type = answers.transport_type;
        }
        if answers.recommendation_score.is_some() {
            self.recommendation_score = answers.recommendation_score;
        }
        if answers.gate_findability.is_some() {
            self.gate_findability = answers.gate_findability;
        }
        if answers.highlight.is_some() {
            self.highlight = answers.highlight;
        }
        if answers.frustration.is_some() {
            self.frustration = answers.frustration;
        }
        if answers.next_vibe_score.is_some() {
            self.next_vibe_score = answers.next_vibe_score;
        }
        if answers.artist_wish.is_some() {
            self.artist_wish = answers.artist_wish.clone();
        }
    }
}

/// The ten optional survey answers, shared by create and update payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswers {
    pub gender_identity: Option<GenderIdentity>,
    pub age_range: Option<AgeRange>,
    pub event_type: Option<EventType>,
    pub transport_type: Option<TransportType>,
    pub recommendation_score: Option<i32>,
    pub gate_findability: Option<Findability>,
    pub highlight: Option<Highlight>,
    pub frustration: Option<Frustration>,
    pub next_vibe_score: Option<i32>,
    pub artist_wish: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewResearch {
    pub user_id: i64,
    pub answers: SurveyAnswers,
}

#[derive(Debug, Clone, Default)]
pub struct ResearchChanges {
    pub user_id: Option<i64>,
    pub answers: SurveyAnswers,
}

/// The respondent fields exposed alongside a research row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchOwner {
    pub id: i64,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchWithOwner {
    #[serde(flatten)]
    pub research: Research,
    pub user: Option<ResearchOwner>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(id: i64) -> Research {
        let now = Utc::now();
        Research {
            id,
            user_id: 1,
            gender_identity: None,
            age_range: None,
            event_type: None,
            transport_type: None,
            recommendation_score: None,
            gate_findability: None,
            highlight: None,
            frustration: None,
            next_vibe_score: None,
            artist_wish: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn apply_only_touches_provided_fields() {
        let mut research = blank(1);
        research.artist_wish = Some("Anitta".to_string());
        research.apply(&ResearchChanges {
            user_id: None,
            answers: SurveyAnswers {
                recommendation_score: Some(9),
                highlight: Some(Highlight::FoodAreas),
                ..Default::default()
            },
        });
        assert_eq!(research.recommendation_score, Some(9));
        assert_eq!(research.highlight, Some(Highlight::FoodAreas));
        assert_eq!(research.artist_wish.as_deref(), Some("Anitta"));
        assert_eq!(research.user_id, 1);
    }

    #[test]
    fn answer_reports_wire_names() {
        let mut research = blank(2);
        research.transport_type = Some(TransportType::RideTaxi);
        assert_eq!(research.answer(Dimension::TransportType), Some("RIDE_TAXI"));
        assert_eq!(research.answer(Dimension::Frustration), None);
    }

    #[test]
    fn owner_is_flattened_next_to_the_row() {
        let value = serde_json::to_value(ResearchWithOwner {
            research: blank(3),
            user: Some(ResearchOwner {
                id: 1,
                full_name: "Ana".to_string(),
                email: "ana@x.com".to_string(),
            }),
        })
        .unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["userId"], 1);
        assert_eq!(value["user"]["fullName"], "Ana");
    }
}
