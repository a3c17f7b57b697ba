pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod handlers;
pub mod middleware;
pub mod state;

#[cfg(test)]
pub mod testing;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{HttpMakeClassifier, TraceLayer},
};

use crate::config::{SecurityConfig, ServerConfig};
use crate::state::AppState;

/// Full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        // Protected
        .merge(git_routes(state.clone()))
        .with_state(state)
}

fn git_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::git;

    Router::new()
        .route("/api/git/status", get(git::status_get))
        .route("/api/git/log", get(git::log_get))
        .route("/api/git/branch-status", get(git::branch_status_get))
        .route("/api/git/pull", post(git::pull_post))
        .route("/api/git/deploy", post(git::deploy_post))
        .route_layer(from_fn_with_state(state, middleware::jwt_auth_middleware))
}

/// CORS policy from the security section; `None` when CORS is disabled
pub fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let allow_origin = if security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

/// Per-request tracing spans; `None` when request logging is turned off
pub fn trace_layer(server: &ServerConfig) -> Option<TraceLayer<HttpMakeClassifier>> {
    server.enable_request_logging.then(TraceLayer::new_for_http)
}
