// handlers/protected/git/branch_status.rs - GET /api/git/branch-status
use axum::extract::State;

use crate::git::BranchStatus;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Ahead/behind counts of the current branch against the remote
pub async fn branch_status_get(State(state): State<AppState>) -> ApiResult<BranchStatus> {
    let status = state.git.branch_status().await?;
    Ok(ApiResponse::success(status))
}
