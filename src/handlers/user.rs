use axum::{extract::State, Extension};

use crate::api::dto::UpdateUser;
use crate::api::ValidatedJson;
use crate::app::AppState;
use crate::database::models::{User, UserProfile};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{Message, UserService};

/// GET /user/me - Profile of the authenticated user
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserProfile> {
    let profile = UserService::new(state.store).find_user_by_id(user.id()).await?;
    Ok(ApiResponse::success(profile))
}

/// PATCH /user/me - Update name, email or password of the authenticated user
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(update): ValidatedJson<UpdateUser>,
) -> ApiResult<UserProfile> {
    let profile = UserService::new(state.store).update_user(user.id(), update).await?;
    Ok(ApiResponse::success(profile))
}

/// DELETE /user/me - Soft-delete the authenticated account and its role links
pub async fn delete_me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Message> {
    let message = UserService::new(state.store).delete_my_account(user.id()).await?;
    Ok(ApiResponse::success(message))
}

/// GET /user - All active users (ADMIN)
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = UserService::new(state.store).list_users().await?;
    Ok(ApiResponse::success(users))
}
