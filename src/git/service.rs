use std::path::Path;
use std::sync::Arc;

use crate::config::RepositorySettings;

use super::error::GitError;
use super::lock::RepositoryLocks;
use super::runner::{CommandRunner, SystemRunner};
use super::types::CommandResult;

/// Git operations on the managed working copy.
///
/// Every public operation validates the repository directory first; the
/// read-only ones live in `inspect`, the deploy workflow in `deploy`.
pub struct GitService {
    pub(crate) settings: RepositorySettings,
    pub(crate) runner: Arc<dyn CommandRunner>,
    pub(crate) locks: Arc<RepositoryLocks>,
}

impl GitService {
    pub fn new(settings: RepositorySettings) -> Self {
        Self::with_runner(settings, Arc::new(SystemRunner::new()))
    }

    pub fn with_runner(settings: RepositorySettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            locks: Arc::new(RepositoryLocks::new()),
        }
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    pub fn repository_path(&self) -> &Path {
        &self.settings.path
    }
}

/// Build a `CommandFailed` error for a command that exited non-zero
pub(crate) fn command_failed(context: &str, result: &CommandResult) -> GitError {
    GitError::CommandFailed {
        message: format!("{context}: {}", result.describe_failure("unknown error")),
        exit_code: Some(result.exit_code),
        output: result.combined_output(),
        steps: Vec::new(),
    }
}
