use axum::{
    extract::{Path, State},
    Extension,
};

use crate::api::dto::{CreateUserRole, UpdateUserRole};
use crate::api::ValidatedJson;
use crate::app::AppState;
use crate::database::models::UserRole;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{Message, UserRoleService};

/// POST /user-role - Link a user to a role
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(create): ValidatedJson<CreateUserRole>,
) -> ApiResult<UserRole> {
    let link = UserRoleService::new(state.store).create(create).await?;
    Ok(ApiResponse::created(link))
}

/// GET /user-role
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<UserRole>> {
    Ok(ApiResponse::success(UserRoleService::new(state.store).list_user_roles().await?))
}

/// PATCH /user-role/me - Re-point the caller's own role link to `roleId`
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(update): ValidatedJson<UpdateUserRole>,
) -> ApiResult<UserRole> {
    let link = UserRoleService::new(state.store)
        .update_my_user_role(user.id(), update)
        .await?;
    Ok(ApiResponse::success(link))
}

/// GET /user-role/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<UserRole> {
    Ok(ApiResponse::success(UserRoleService::new(state.store).find_user_role(id).await?))
}

/// PATCH /user-role/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(update): ValidatedJson<UpdateUserRole>,
) -> ApiResult<UserRole> {
    let link = UserRoleService::new(state.store).update_user_role(id, update).await?;
    Ok(ApiResponse::success(link))
}

/// DELETE /user-role/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Message> {
    Ok(ApiResponse::success(UserRoleService::new(state.store).delete_user_role(id).await?))
}
