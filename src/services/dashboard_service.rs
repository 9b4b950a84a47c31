use futures::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::period::{DateRange, Period};
use super::research_service::summarize;
use super::{analytics, Message};
use crate::api::dto::{DashboardFilter, PreferenceFilter};
use crate::database::models::{Dashboard, DashboardChanges, Dimension, NewDashboard};
use crate::database::{DatabaseError, ResearchFilter, Store};
use crate::error::ApiError;

/// Filtered survey aggregates with every dimension flattened to `{category: count}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnalytics {
    pub total_responses: i64,
    pub average_recommendation_score: f64,
    pub average_next_vibe_score: f64,
    /// Keyed by dimension field name (`genderIdentity`, `gateFindability`, ...).
    pub breakdowns: BTreeMap<&'static str, BTreeMap<String, i64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceAnalytics {
    pub total_submissions: i64,
    pub preference_breakdown: BTreeMap<String, i64>,
}

fn period_conflict(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::Conflict(_) => ApiError::conflict("A dashboard already exists for this period"),
        other => other.into(),
    }
}

pub struct DashboardService {
    store: Arc<dyn Store>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_dashboard(&self, dashboard: NewDashboard) -> Result<Dashboard, ApiError> {
        self.store.create_dashboard(dashboard).await.map_err(period_conflict)
    }

    pub async fn find_all_dashboards(&self) -> Result<Vec<Dashboard>, ApiError> {
        Ok(self.store.list_dashboards().await?)
    }

    pub async fn find_dashboard_by_id(&self, id: i64) -> Result<Dashboard, ApiError> {
        self.store
            .find_dashboard(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Dashboard not found"))
    }

    pub async fn find_dashboard_by_period(&self, period: &str) -> Result<Dashboard, ApiError> {
        self.store
            .find_dashboard_by_period(period)
            .await?
            .ok_or_else(|| ApiError::not_found("No dashboard exists for this period"))
    }

    pub async fn update_dashboard(&self, id: i64, changes: DashboardChanges) -> Result<Dashboard, ApiError> {
        self.find_dashboard_by_id(id).await?;
        self.store
            .update_dashboard(id, changes)
            .await
            .map_err(period_conflict)?
            .ok_or_else(|| ApiError::not_found("Dashboard not found"))
    }

    pub async fn delete_dashboard(&self, id: i64) -> Result<Message, ApiError> {
        if !self.store.soft_delete_dashboard(id).await? {
            return Err(ApiError::not_found("Dashboard not found"));
        }
        Ok(Message::new("Dashboard deleted successfully"))
    }

    /// Recompute the month's aggregates and store them as the period's dashboard.
    pub async fn generate_dashboard_for_period(&self, period: &str) -> Result<Dashboard, ApiError> {
        let period: Period = period.parse()?;
        let filter = ResearchFilter::between(period.start(), period.end());
        let stats = summarize(self.store.as_ref(), &filter).await?;

        let dashboard = self
            .store
            .upsert_dashboard(NewDashboard {
                period: period.to_string(),
                total_responses: stats.total_responses,
                average_recommendation_score: stats.average_recommendation_score,
                gender_identity_distribution: Some(stats.gender_identity_distribution),
                age_range_distribution: Some(stats.age_range_distribution),
                event_type_distribution: Some(stats.event_type_distribution),
                transport_type_distribution: Some(stats.transport_type_distribution),
            })
            .await?;
        info!(
            "Generated dashboard {} for {} ({} responses)",
            dashboard.id, dashboard.period, dashboard.total_responses
        );
        Ok(dashboard)
    }

    pub async fn get_survey_analytics(&self, filter: DashboardFilter) -> Result<SurveyAnalytics, ApiError> {
        let range = DateRange::parse(filter.start_date.as_deref(), filter.end_date.as_deref())?;
        let filter = ResearchFilter {
            created_from: range.from,
            created_before: range.before,
            gender_identity: filter.gender_identity,
            age_range: filter.age_range,
            event_type: filter.event_type,
        };

        let store = self.store.as_ref();
        let groups = try_join_all(
            Dimension::ALL
                .iter()
                .map(|dimension| store.count_research_by(&filter, *dimension)),
        );
        let (totals, groups) = futures::try_join!(store.research_totals(&filter), groups)?;

        let breakdowns = Dimension::ALL
            .iter()
            .zip(groups.iter())
            .map(|(dimension, groups)| (dimension.field(), analytics::flatten(groups)))
            .collect();

        Ok(SurveyAnalytics {
            total_responses: totals.count,
            average_recommendation_score: totals.average_recommendation_score.unwrap_or(0.0),
            average_next_vibe_score: totals.average_next_vibe_score.unwrap_or(0.0),
            breakdowns,
        })
    }

    pub async fn get_preference_analytics(&self, filter: PreferenceFilter) -> Result<PreferenceAnalytics, ApiError> {
        let range = DateRange::parse(filter.start_date.as_deref(), filter.end_date.as_deref())?;
        let submissions = self
            .store
            .list_preference_submissions(range.from, range.before)
            .await?;

        Ok(PreferenceAnalytics {
            total_submissions: submissions.len() as i64,
            preference_breakdown: analytics::tally_preferences(&submissions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{GenderIdentity, Highlight, NewResearch, SurveyAnswers};
    use crate::database::MemoryStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn answers(gender: Option<GenderIdentity>, score: i32) -> NewResearch {
        NewResearch {
            user_id: 1,
            answers: SurveyAnswers {
                gender_identity: gender,
                recommendation_score: Some(score),
                next_vibe_score: Some(score / 2),
                ..Default::default()
            },
        }
    }

    fn may(day: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn generation_is_idempotent_and_reflects_latest_data() {
        let store = Arc::new(MemoryStore::with_default_roles());
        let service = DashboardService::new(store.clone());
        store.create_research_at(answers(Some(GenderIdentity::CisgenderWoman), 10), may(3)).await;
        store.create_research_at(answers(None, 4), Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()).await;

        let first = service.generate_dashboard_for_period("2024-05").await.unwrap();
        assert_eq!(first.total_responses, 1);
        assert_eq!(first.average_recommendation_score, 10.0);

        store.create_research_at(answers(Some(GenderIdentity::CisgenderMan), 6), may(31)).await;
        let second = service.generate_dashboard_for_period("2024-05").await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.total_responses, 2);
        assert_eq!(second.average_recommendation_score, 8.0);
        assert_eq!(
            second.gender_identity_distribution,
            Some(json!([
                {"genderIdentity": "CISGENDER_MAN", "count": 1},
                {"genderIdentity": "CISGENDER_WOMAN", "count": 1},
            ]))
        );
        assert_eq!(store.dashboard_row_count("2024-05").await, 1);
        assert_eq!(service.find_all_dashboards().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generation_rejects_malformed_periods() {
        let service = DashboardService::new(Arc::new(MemoryStore::with_default_roles()));
        let err = service.generate_dashboard_for_period("2024-5").await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn crud_orders_by_period_and_conflicts_on_duplicates() {
        let service = DashboardService::new(Arc::new(MemoryStore::with_default_roles()));
        for period in ["2024-01", "2024-03", "2024-02"] {
            service
                .create_dashboard(NewDashboard {
                    period: period.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let periods: Vec<String> = service
            .find_all_dashboards()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.period)
            .collect();
        assert_eq!(periods, vec!["2024-03", "2024-02", "2024-01"]);

        let duplicate = service
            .create_dashboard(NewDashboard {
                period: "2024-02".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(duplicate, ApiError::Conflict(ref msg) if msg == "A dashboard already exists for this period"));

        let february = service.find_dashboard_by_period("2024-02").await.unwrap();
        let updated = service
            .update_dashboard(
                february.id,
                DashboardChanges {
                    total_responses: Some(12),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_responses, 12);
        assert!(matches!(
            service
                .update_dashboard(
                    february.id,
                    DashboardChanges {
                        period: Some("2024-01".to_string()),
                        ..Default::default()
                    }
                )
                .await,
            Err(ApiError::Conflict(_))
        ));

        service.delete_dashboard(february.id).await.unwrap();
        assert!(matches!(service.find_dashboard_by_id(february.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(service.find_dashboard_by_period("2024-02").await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn survey_analytics_filters_and_flattens() {
        let store = Arc::new(MemoryStore::with_default_roles());
        let service = DashboardService::new(store.clone());
        let mut loved = answers(Some(GenderIdentity::CisgenderWoman), 10);
        loved.answers.highlight = Some(Highlight::FoodAreas);
        store.create_research_at(loved, may(2)).await;
        store.create_research_at(answers(Some(GenderIdentity::CisgenderWoman), 6), may(20)).await;
        store.create_research_at(answers(None, 0), may(21)).await;

        let everything = service.get_survey_analytics(DashboardFilter::default()).await.unwrap();
        assert_eq!(everything.total_responses, 3);
        assert_eq!(everything.breakdowns.len(), 7);
        assert_eq!(everything.breakdowns["genderIdentity"]["CISGENDER_WOMAN"], 2);
        assert_eq!(everything.breakdowns["genderIdentity"]["null"], 1);
        assert_eq!(everything.breakdowns["highlight"]["FOOD_AREAS"], 1);
        assert_eq!(everything.breakdowns["highlight"]["null"], 2);

        let filtered = service
            .get_survey_analytics(DashboardFilter {
                end_date: Some("2024-05-20".to_string()),
                gender_identity: Some(GenderIdentity::CisgenderWoman),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.total_responses, 2);
        assert_eq!(filtered.average_recommendation_score, 8.0);
        assert_eq!(filtered.average_next_vibe_score, 4.0);

        let empty = service
            .get_survey_analytics(DashboardFilter {
                start_date: Some("2025-01-01".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(empty.total_responses, 0);
        assert_eq!(empty.average_recommendation_score, 0.0);
        assert!(empty.breakdowns["genderIdentity"].is_empty());
    }

    #[tokio::test]
    async fn preference_analytics_tallies_every_preference() {
        let store = Arc::new(MemoryStore::with_default_roles());
        let service = DashboardService::new(store.clone());
        store
            .create_preference_submission(vec!["A".to_string(), "B".to_string()])
            .await
            .unwrap();
        store.create_preference_submission(vec!["A".to_string()]).await.unwrap();

        let analytics = service.get_preference_analytics(PreferenceFilter::default()).await.unwrap();
        assert_eq!(
            serde_json::to_value(&analytics).unwrap(),
            json!({"totalSubmissions": 2, "preferenceBreakdown": {"A": 2, "B": 1}})
        );
    }

    #[tokio::test]
    async fn preference_analytics_honours_the_date_range() {
        let store = Arc::new(MemoryStore::with_default_roles());
        let service = DashboardService::new(store.clone());
        store.create_preference_submission_at(vec!["rock".to_string()], may(1)).await;
        store.create_preference_submission_at(vec!["jazz".to_string()], may(15)).await;

        let analytics = service
            .get_preference_analytics(PreferenceFilter {
                start_date: Some("2024-05-10".to_string()),
                end_date: Some("2024-05-15".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(analytics.total_submissions, 1);
        assert_eq!(analytics.preference_breakdown.keys().collect::<Vec<_>>(), vec!["jazz"]);
    }
}
