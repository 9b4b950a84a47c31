use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::auth::AuthUser;
use crate::database::models::role::ADMIN;
use crate::error::ApiError;

/// Role set for administrative routes.
pub const ADMIN_ONLY: &[&str] = &[ADMIN];

/// Role guard. Must run inside [`super::jwt_auth_middleware`]; passes when the
/// principal holds at least one of `roles`.
pub async fn require_roles(
    State(roles): State<&'static [&'static str]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.has_any_role(roles) {
        debug!("User {} lacks any of {:?} for {}", user.id(), roles, request.uri().path());
        return Err(ApiError::forbidden("You do not have permission to access this resource"));
    }

    Ok(next.run(request).await)
}
