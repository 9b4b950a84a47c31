use axum::extract::{Path, State};

use crate::api::dto::{CreateRole, UpdateRole};
use crate::api::ValidatedJson;
use crate::app::AppState;
use crate::database::models::Role;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Message, RoleService};

/// POST /role
pub async fn create(State(state): State<AppState>, ValidatedJson(create): ValidatedJson<CreateRole>) -> ApiResult<Role> {
    let role = RoleService::new(state.store).create_role(create).await?;
    Ok(ApiResponse::created(role))
}

/// GET /role
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Role>> {
    Ok(ApiResponse::success(RoleService::new(state.store).list_roles().await?))
}

/// GET /role/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Role> {
    Ok(ApiResponse::success(RoleService::new(state.store).find_role_by_id(id).await?))
}

/// PATCH /role/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(update): ValidatedJson<UpdateRole>,
) -> ApiResult<Role> {
    Ok(ApiResponse::success(RoleService::new(state.store).update_role(id, update).await?))
}

/// DELETE /role/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Message> {
    Ok(ApiResponse::success(RoleService::new(state.store).delete_role(id).await?))
}
