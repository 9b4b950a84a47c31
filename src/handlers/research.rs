use axum::extract::{Path, State};

use crate::api::dto::{CreateResearch, UpdateResearch};
use crate::api::ValidatedJson;
use crate::app::AppState;
use crate::database::models::{Research, ResearchWithOwner};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::research_service::ResearchStatistics;
use crate::services::{Message, ResearchService};

/// POST /research - Record a survey response for an existing user
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(create): ValidatedJson<CreateResearch>,
) -> ApiResult<Research> {
    let research = ResearchService::new(state.store).create_research(create).await?;
    Ok(ApiResponse::created(research))
}

/// GET /research - Every active response with its owner (ADMIN)
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ResearchWithOwner>> {
    Ok(ApiResponse::success(ResearchService::new(state.store).find_all_research().await?))
}

/// GET /research/statistics - Count, NPS average and demographic distributions (ADMIN)
///
/// ```json
/// {
///   "totalResponses": 2,
///   "averageRecommendationScore": 8.0,
///   "genderIdentityDistribution": [{ "genderIdentity": "CISGENDER_WOMAN", "count": 1 }, { "genderIdentity": null, "count": 1 }],
///   "ageRangeDistribution": [...],
///   "eventTypeDistribution": [...],
///   "transportTypeDistribution": [...]
/// }
/// ```
pub async fn statistics(State(state): State<AppState>) -> ApiResult<ResearchStatistics> {
    Ok(ApiResponse::success(
        ResearchService::new(state.store).get_research_statistics().await?,
    ))
}

/// GET /research/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<ResearchWithOwner> {
    Ok(ApiResponse::success(ResearchService::new(state.store).find_research_by_id(id).await?))
}

/// PUT /research/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(update): ValidatedJson<UpdateResearch>,
) -> ApiResult<Research> {
    Ok(ApiResponse::success(
        ResearchService::new(state.store).update_research(id, update).await?,
    ))
}

/// DELETE /research/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Message> {
    Ok(ApiResponse::success(ResearchService::new(state.store).delete_research(id).await?))
}
