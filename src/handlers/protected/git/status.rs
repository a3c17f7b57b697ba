// handlers/protected/git/status.rs - GET /api/git/status
use axum::extract::State;

use crate::git::StatusReport;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Working tree changes and current branch
pub async fn status_get(State(state): State<AppState>) -> ApiResult<StatusReport> {
    let report = state.git.status().await?;
    Ok(ApiResponse::success(report))
}
