use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::database::Store;
use crate::handlers;
use crate::middleware::{jwt_auth_middleware, require_roles, ADMIN_ONLY};

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Full HTTP surface with CORS taken from the global configuration.
pub fn app(state: AppState) -> Router {
    router(state, &crate::config::config().security)
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(public_routes())
        .merge(authenticated_routes(&state))
        .merge(admin_routes(&state))
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::{auth, public};

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/preferences", post(public::create_preference))
        .route("/survey", post(public::create_survey))
}

fn authenticated_routes(state: &AppState) -> Router<AppState> {
    use handlers::{research, user, user_role};

    Router::new()
        .route("/user/me", get(user::me).patch(user::update_me).delete(user::delete_me))
        .route("/user-role/me", patch(user_role::update_me))
        .route("/research", post(research::create))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

// Layers added later run first: the JWT layer resolves the principal before the role guard reads it.
fn admin_routes(state: &AppState) -> Router<AppState> {
    use handlers::{dashboard, research, role, user, user_role};

    Router::new()
        .route("/user", get(user::list))
        .route("/role", post(role::create).get(role::list))
        .route("/role/:id", get(role::get).patch(role::update).delete(role::delete))
        .route("/user-role", post(user_role::create).get(user_role::list))
        .route(
            "/user-role/:id",
            get(user_role::get).patch(user_role::update).delete(user_role::delete),
        )
        .route("/research", get(research::list))
        .route("/research/statistics", get(research::statistics))
        .route(
            "/research/:id",
            get(research::get).put(research::update).delete(research::delete),
        )
        .route("/dashboard", get(dashboard::list).post(dashboard::create))
        .route("/dashboard/generate/:period", post(dashboard::generate))
        .route("/dashboard/period/:period", get(dashboard::get_by_period))
        .route("/dashboard/analytics/survey", get(dashboard::survey_analytics))
        .route("/dashboard/analytics/preferences", get(dashboard::preference_analytics))
        .route(
            "/dashboard/:id",
            get(dashboard::get).put(dashboard::update).delete(dashboard::delete),
        )
        .route_layer(from_fn_with_state(ADMIN_ONLY, require_roles))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() || security.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
