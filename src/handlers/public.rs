use axum::extract::State;

use crate::api::dto::{CreatePreference, CreateResearch};
use crate::api::ValidatedJson;
use crate::app::AppState;
use crate::database::models::{PreferenceSubmission, Research};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::PublicService;

/// POST /preferences - Anonymous preference poll, `{ "preferences": ["rock", "samba"] }`
pub async fn create_preference(
    State(state): State<AppState>,
    ValidatedJson(create): ValidatedJson<CreatePreference>,
) -> ApiResult<PreferenceSubmission> {
    let submission = PublicService::new(state.store).create_preference_submission(create).await?;
    Ok(ApiResponse::created(submission))
}

/// POST /survey - Unauthenticated survey response
pub async fn create_survey(
    State(state): State<AppState>,
    ValidatedJson(create): ValidatedJson<CreateResearch>,
) -> ApiResult<Research> {
    let research = PublicService::new(state.store).create_survey_response(create).await?;
    Ok(ApiResponse::created(research))
}
