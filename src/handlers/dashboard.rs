use axum::extract::{Path, State};

use crate::api::dto::{DashboardFilter, PreferenceFilter};
use crate::api::{ValidatedJson, ValidatedQuery};
use crate::app::AppState;
use crate::database::models::{Dashboard, DashboardChanges, NewDashboard};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::dashboard_service::{PreferenceAnalytics, SurveyAnalytics};
use crate::services::{DashboardService, Message};

/// POST /dashboard - Store a dashboard for a period that has none yet
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(dashboard): ValidatedJson<NewDashboard>,
) -> ApiResult<Dashboard> {
    let dashboard = DashboardService::new(state.store).create_dashboard(dashboard).await?;
    Ok(ApiResponse::created(dashboard))
}

/// POST /dashboard/generate/:period - Recompute the YYYY-MM dashboard from survey data
pub async fn generate(State(state): State<AppState>, Path(period): Path<String>) -> ApiResult<Dashboard> {
    let dashboard = DashboardService::new(state.store)
        .generate_dashboard_for_period(&period)
        .await?;
    Ok(ApiResponse::success(dashboard))
}

/// GET /dashboard - Newest period first
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Dashboard>> {
    Ok(ApiResponse::success(DashboardService::new(state.store).find_all_dashboards().await?))
}

/// GET /dashboard/period/:period
pub async fn get_by_period(State(state): State<AppState>, Path(period): Path<String>) -> ApiResult<Dashboard> {
    Ok(ApiResponse::success(
        DashboardService::new(state.store).find_dashboard_by_period(&period).await?,
    ))
}

/// GET /dashboard/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Dashboard> {
    Ok(ApiResponse::success(DashboardService::new(state.store).find_dashboard_by_id(id).await?))
}

/// PUT /dashboard/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(changes): ValidatedJson<DashboardChanges>,
) -> ApiResult<Dashboard> {
    Ok(ApiResponse::success(
        DashboardService::new(state.store).update_dashboard(id, changes).await?,
    ))
}

/// DELETE /dashboard/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Message> {
    Ok(ApiResponse::success(DashboardService::new(state.store).delete_dashboard(id).await?))
}

/// GET /dashboard/analytics/survey?startDate&endDate&genderIdentity&ageRange&eventType
///
/// ```json
/// {
///   "totalResponses": 3,
///   "averageRecommendationScore": 5.33,
///   "averageNextVibeScore": 2.0,
///   "breakdowns": {
///     "genderIdentity": { "CISGENDER_WOMAN": 2, "null": 1 },
///     "highlight": { "FOOD_AREAS": 1, "null": 2 }
///   }
/// }
/// ```
pub async fn survey_analytics(
    State(state): State<AppState>,
    ValidatedQuery(filter): ValidatedQuery<DashboardFilter>,
) -> ApiResult<SurveyAnalytics> {
    Ok(ApiResponse::success(
        DashboardService::new(state.store).get_survey_analytics(filter).await?,
    ))
}

/// GET /dashboard/analytics/preferences?startDate&endDate
pub async fn preference_analytics(
    State(state): State<AppState>,
    ValidatedQuery(filter): ValidatedQuery<PreferenceFilter>,
) -> ApiResult<PreferenceAnalytics> {
    Ok(ApiResponse::success(
        DashboardService::new(state.store).get_preference_analytics(filter).await?,
    ))
}
