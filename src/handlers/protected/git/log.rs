// handlers/protected/git/log.rs - GET /api/git/log?limit=N
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::ApiError;
use crate::git::CommitRecord;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// Kept as text so a malformed value gets the JSON error envelope
    pub limit: Option<String>,
}

impl LogQuery {
    fn limit(&self) -> Result<Option<u32>, ApiError> {
        match self.limit.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<u32>()
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("limit must be a positive integer, got '{}'", raw))),
        }
    }
}

/// Most recent commits, newest first
pub async fn log_get(State(state): State<AppState>, Query(query): Query<LogQuery>) -> ApiResult<Vec<CommitRecord>> {
    let commits = state.git.log(query.limit()?).await?;
    Ok(ApiResponse::success(commits))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<&str>) -> LogQuery {
        LogQuery {
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn limit_parsing() {
        assert_eq!(query(None).limit().unwrap(), None);
        assert_eq!(query(Some("")).limit().unwrap(), None);
        assert_eq!(query(Some("20")).limit().unwrap(), Some(20));
        assert_eq!(query(Some("-1")).limit().unwrap_err().status_code(), 400);
        assert_eq!(query(Some("ten")).limit().unwrap_err().status_code(), 400);
    }
}
