use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::app::AppState;
use crate::auth::validate_jwt;
use crate::database::models::UserWithRoles;
use crate::error::ApiError;
use crate::services::UserService;

/// Authenticated principal attached to the request by [`jwt_auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthUser(pub UserWithRoles);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.profile.id
    }
}

/// Validates the bearer token and resolves its subject to an active user with roles.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token)?;

    let user = UserService::new(state.store.clone())
        .find_by_id_with_roles(claims.sub)
        .await
        .map_err(|err| match err {
            ApiError::NotFound(_) => {
                warn!("Token subject {} no longer resolves to an active user", claims.sub);
                ApiError::unauthorized("User no longer exists")
            }
            other => other,
        })?;

    debug!("Authenticated user {} with roles {:?}", user.profile.id, role_names(&user));
    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

fn role_names(user: &UserWithRoles) -> Vec<&str> {
    user.roles.iter().map(|role| role.name.as_str()).collect()
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
