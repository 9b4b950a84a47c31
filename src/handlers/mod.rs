// Route handlers grouped by resource. Access control is applied by the router:
// public routes carry no layer, authenticated routes carry the JWT layer and
// administrative routes additionally carry the ADMIN role guard.
pub mod auth;
pub mod dashboard;
pub mod public;
pub mod research;
pub mod role;
pub mod user;
pub mod user_role;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - Service name, version and route map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Survey API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Event survey and preference poll backend",
            "endpoints": {
                "auth": "/auth/register, /auth/login (public)",
                "public": "/survey, /preferences (public)",
                "user": "/user/me (authenticated), /user (admin)",
                "research": "POST /research (authenticated), /research[/:id], /research/statistics (admin)",
                "dashboard": "/dashboard/* (admin)",
                "roles": "/role/*, /user-role/* (admin), PATCH /user-role/me (authenticated)",
            }
        }
    }))
}

/// GET /health - Liveness plus store reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
