// handlers/public/health.rs - GET / and GET /health
use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::git::ensure_repository;
use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Protocol Admin",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "status": "GET /api/git/status (authenticated)",
                "log": "GET /api/git/log?limit=N (authenticated)",
                "branch_status": "GET /api/git/branch-status (authenticated)",
                "pull": "POST /api/git/pull (admin, editor)",
                "deploy": "POST /api/git/deploy (admin, editor)",
            }
        }
    }))
}

/// Liveness plus a check that the managed repository is usable
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    ensure_repository(state.git.repository_path())
        .map_err(|e| ApiError::service_unavailable(format!("repository unavailable: {}", e)))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "repository": "ok"
        }
    })))
}
