use axum::extract::State;

use crate::api::dto::{LoginUser, RegisterUser};
use crate::api::ValidatedJson;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::AuthPayload;
use crate::services::AuthService;

/// POST /auth/register - Create a PATIENT account and return a token
///
/// ```json
/// { "fullName": "Ana", "email": "ana@x.com", "passwordHash": "Str0ng!Pass" }
/// ```
///
/// Responds 201 with `{ message, user: { id, fullName, email }, token }`.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(register): ValidatedJson<RegisterUser>,
) -> ApiResult<AuthPayload> {
    let payload = AuthService::new(state.store).register(register).await?;
    Ok(ApiResponse::created(payload))
}

/// POST /auth/login - Exchange email and password for a 24h bearer token
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(login): ValidatedJson<LoginUser>,
) -> ApiResult<AuthPayload> {
    let payload = AuthService::new(state.store).login(login).await?;
    Ok(ApiResponse::success(payload))
}
