use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::types::DeployStep;

/// Errors raised by the git service and its command runner
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Repository directory is not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Command '{program}' not found, make sure it is installed and on PATH")]
    ToolNotFound { program: String },

    #[error("Command '{program}' timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A command (or deploy step) reported failure. `steps` holds the deploy
    /// trace completed before the failure and is empty outside of deploy.
    #[error("{message}")]
    CommandFailed {
        message: String,
        exit_code: Option<i32>,
        output: String,
        steps: Vec<DeployStep>,
    },

    #[error("Working tree is not clean, commit or stash changes first")]
    DirtyWorkingTree,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Another pull or deploy is already running on {}", .0.display())]
    OperationInProgress(PathBuf),
}

/// Closed set of error kinds, used by the API boundary to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitErrorKind {
    DirectoryNotFound,
    NotARepository,
    ToolNotFound,
    Timeout,
    SpawnError,
    CommandFailed,
    DirtyWorkingTree,
    InvalidArgument,
    OperationInProgress,
}

impl GitErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitErrorKind::DirectoryNotFound => "DIRECTORY_NOT_FOUND",
            GitErrorKind::NotARepository => "NOT_A_REPOSITORY",
            GitErrorKind::ToolNotFound => "TOOL_NOT_FOUND",
            GitErrorKind::Timeout => "TIMEOUT",
            GitErrorKind::SpawnError => "SPAWN_ERROR",
            GitErrorKind::CommandFailed => "COMMAND_FAILED",
            GitErrorKind::DirtyWorkingTree => "DIRTY_WORKING_TREE",
            GitErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            GitErrorKind::OperationInProgress => "OPERATION_IN_PROGRESS",
        }
    }
}

impl GitError {
    pub fn kind(&self) -> GitErrorKind {
        match self {
            GitError::DirectoryNotFound(_) => GitErrorKind::DirectoryNotFound,
            GitError::NotARepository(_) => GitErrorKind::NotARepository,
            GitError::ToolNotFound { .. } => GitErrorKind::ToolNotFound,
            GitError::Timeout { .. } => GitErrorKind::Timeout,
            GitError::Spawn { .. } => GitErrorKind::SpawnError,
            GitError::CommandFailed { .. } => GitErrorKind::CommandFailed,
            GitError::DirtyWorkingTree => GitErrorKind::DirtyWorkingTree,
            GitError::InvalidArgument(_) => GitErrorKind::InvalidArgument,
            GitError::OperationInProgress(_) => GitErrorKind::OperationInProgress,
        }
    }

    /// Deploy steps completed before this error, empty for non-deploy failures
    pub fn steps(&self) -> &[DeployStep] {
        match self {
            GitError::CommandFailed { steps, .. } => steps,
            _ => &[],
        }
    }

    /// Attach a partial deploy trace to this error.
    ///
    /// Only `CommandFailed` carries a trace; runner failures raised in the
    /// middle of a deploy are folded into `CommandFailed` so the caller still
    /// learns how far the sequence got.
    pub fn with_steps(self, trace: Vec<DeployStep>) -> Self {
        match self {
            GitError::CommandFailed {
                message,
                exit_code,
                output,
                ..
            } => GitError::CommandFailed {
                message,
                exit_code,
                output,
                steps: trace,
            },
            GitError::ToolNotFound { .. } | GitError::Timeout { .. } | GitError::Spawn { .. } => {
                let message = self.to_string();
                GitError::CommandFailed {
                    output: message.clone(),
                    message,
                    exit_code: None,
                    steps: trace,
                }
            }
            other => other,
        }
    }
}

pub type GitResult<T> = Result<T, GitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::types::StepStatus;

    #[test]
    fn with_steps_attaches_trace_to_command_failure() {
        let err = GitError::CommandFailed {
            message: "git push failed".to_string(),
            exit_code: Some(1),
            output: "rejected".to_string(),
            steps: Vec::new(),
        };
        let trace = vec![DeployStep::new("git add", StepStatus::Success, "ok")];

        let err = err.with_steps(trace);
        assert_eq!(err.kind(), GitErrorKind::CommandFailed);
        assert_eq!(err.steps().len(), 1);
        assert_eq!(err.to_string(), "git push failed");
    }

    #[test]
    fn with_steps_folds_runner_failures_into_command_failed() {
        let err = GitError::Timeout {
            program: "npm".to_string(),
            timeout: Duration::from_secs(5),
        };
        let err = err.with_steps(vec![DeployStep::new("git add", StepStatus::Success, "ok")]);

        assert_eq!(err.kind(), GitErrorKind::CommandFailed);
        assert!(err.to_string().contains("timed out after 5s"));
        assert_eq!(err.steps().len(), 1);
    }

    #[test]
    fn invalid_argument_has_no_steps() {
        let err = GitError::InvalidArgument("commit message must not be empty".to_string());
        assert!(err.with_steps(Vec::new()).steps().is_empty());
    }
}
