// handlers/protected/git/pull.rs - POST /api/git/pull
use axum::extract::{Extension, State};

use super::WRITE_ROLES;
use crate::audit::AuditEntry;
use crate::git::PullOutcome;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// Pull the current branch; refused while the working tree is dirty
pub async fn pull_post(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<PullOutcome> {
    user.require_role(WRITE_ROLES)?;

    tracing::info!(user = %user.username, "git pull requested");
    let outcome = state.git.pull().await?;

    if let Err(e) = state.audit.record(&AuditEntry::git_pull(&user)).await {
        tracing::error!(error = %e, "failed to record audit entry for git pull");
    }

    Ok(ApiResponse::success(outcome))
}
