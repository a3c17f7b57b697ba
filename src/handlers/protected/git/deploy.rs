// handlers/protected/git/deploy.rs - POST /api/git/deploy
use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use serde::Deserialize;

use super::WRITE_ROLES;
use crate::audit::AuditEntry;
use crate::error::ApiError;
use crate::git::DeployReport;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeployRequest {
    #[serde(default)]
    pub commit_message: String,
}

/// Commit, build and publish. The response carries every step that ran; on
/// failure the error body carries the steps completed before it.
pub async fn deploy_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<DeployRequest>, JsonRejection>,
) -> ApiResult<DeployReport> {
    user.require_role(WRITE_ROLES)?;

    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    tracing::info!(user = %user.username, "deploy requested");
    let report = state.git.deploy(&request.commit_message).await?;

    let entry = AuditEntry::git_deploy(&user, &request.commit_message);
    if let Err(e) = state.audit.record(&entry).await {
        tracing::error!(error = %e, "failed to record audit entry for deploy");
    }

    Ok(ApiResponse::success(report))
}
