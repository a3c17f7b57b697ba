//! Read-only repository queries and the pull operation.

use std::path::Path;

use tracing::{debug, info, warn};

use super::error::{GitError, GitResult};
use super::guard::ensure_repository;
use super::parse::{parse_count, parse_log, parse_porcelain, LOG_FORMAT};
use super::runner::git;
use super::service::{command_failed, GitService};
use super::types::{BranchStatus, ChangeEntry, CommitRecord, PullOutcome, StatusReport};

const UNKNOWN_BRANCH: &str = "unknown";

impl GitService {
    /// Working-tree changes and the current branch
    pub async fn status(&self) -> GitResult<StatusReport> {
        let repo = ensure_repository(&self.settings.path)?;

        let changed_files = self.changed_files(&repo).await?;

        // Best effort: a failed branch lookup must not hide the change list
        let current_branch = match self.current_branch(&repo).await {
            Ok(branch) if !branch.is_empty() => branch,
            Ok(_) => UNKNOWN_BRANCH.to_string(),
            Err(e) => {
                debug!(error = %e, "current branch lookup failed");
                UNKNOWN_BRANCH.to_string()
            }
        };

        Ok(StatusReport {
            is_clean: changed_files.is_empty(),
            current_branch,
            changed_files,
        })
    }

    /// The newest `limit` commits (configured default when `None`)
    pub async fn log(&self, limit: Option<u32>) -> GitResult<Vec<CommitRecord>> {
        let limit = match limit {
            None => self.settings.default_log_limit,
            Some(0) => {
                return Err(GitError::InvalidArgument(
                    "limit must be a positive integer".to_string(),
                ))
            }
            Some(n) => n.min(self.settings.max_log_limit),
        };

        let repo = ensure_repository(&self.settings.path)?;

        // The pretty format carries '%' placeholders; the runner passes it verbatim
        let spec = git(
            [
                "log".to_string(),
                format!("-{limit}"),
                LOG_FORMAT.to_string(),
                "--date=iso".to_string(),
            ],
            &repo,
        )
        .timeout(self.settings.query_timeout());

        let result = self.runner.run(&spec).await?;
        if !result.success() {
            return Err(command_failed("git log failed", &result));
        }

        Ok(parse_log(&result.stdout))
    }

    /// Current branch and how far it has diverged from its remote counterpart
    pub async fn branch_status(&self) -> GitResult<BranchStatus> {
        let repo = ensure_repository(&self.settings.path)?;
        let remote = self.settings.remote.as_str();

        let current_branch = self.current_branch(&repo).await?;

        // Refresh remote-tracking refs; stale refs still give usable counts
        let fetch = git(["fetch", remote], &repo).timeout(self.settings.query_timeout());
        match self.runner.run(&fetch).await {
            Ok(result) if result.success() => {}
            Ok(result) => debug!(exit_code = result.exit_code, "git fetch failed, using cached remote refs"),
            Err(e) => debug!(error = %e, "git fetch failed, using cached remote refs"),
        }

        let has_remote = !current_branch.is_empty() && self.remote_branch_exists(&repo, &current_branch).await;

        let (ahead, behind) = if has_remote {
            let remote_ref = format!("{remote}/{current_branch}");
            let ahead = self.count_commits(&repo, &format!("{remote_ref}..{current_branch}")).await;
            let behind = self.count_commits(&repo, &format!("{current_branch}..{remote_ref}")).await;
            (ahead, behind)
        } else {
            (0, 0)
        };

        Ok(BranchStatus {
            current_branch,
            has_remote,
            ahead,
            behind,
        })
    }

    /// Pull from the remote; refuses to run on a dirty working tree
    pub async fn pull(&self) -> GitResult<PullOutcome> {
        let repo = ensure_repository(&self.settings.path)?;
        let _lock = self.locks.try_acquire(&repo)?;

        if !self.changed_files(&repo).await?.is_empty() {
            return Err(GitError::DirtyWorkingTree);
        }

        let spec = git(["pull"], &repo).timeout(self.settings.command_timeout());
        let result = self.runner.run(&spec).await?;
        if !result.success() {
            warn!(exit_code = result.exit_code, "git pull failed");
            return Err(command_failed("git pull failed", &result));
        }

        info!(repo = %repo.display(), "git pull succeeded");
        Ok(PullOutcome {
            message: "Pull succeeded".to_string(),
            output: result.stdout,
        })
    }

    pub(crate) async fn changed_files(&self, repo: &Path) -> GitResult<Vec<ChangeEntry>> {
        let spec = git(["status", "--porcelain"], repo).timeout(self.settings.query_timeout());
        let result = self.runner.run(&spec).await?;
        if !result.success() {
            return Err(command_failed("git status failed", &result));
        }
        Ok(parse_porcelain(&result.stdout))
    }

    /// Empty when HEAD is detached
    pub(crate) async fn current_branch(&self, repo: &Path) -> GitResult<String> {
        let spec = git(["branch", "--show-current"], repo).timeout(self.settings.query_timeout());
        let result = self.runner.run(&spec).await?;
        if !result.success() {
            return Err(command_failed("unable to determine current branch", &result));
        }
        Ok(result.stdout.trim().to_string())
    }

    async fn remote_branch_exists(&self, repo: &Path, branch: &str) -> bool {
        let spec = git(["ls-remote", "--heads", self.settings.remote.as_str(), branch], repo)
            .timeout(self.settings.query_timeout());
        match self.runner.run(&spec).await {
            Ok(result) => result.success() && !result.stdout.trim().is_empty(),
            Err(e) => {
                debug!(error = %e, "git ls-remote failed");
                false
            }
        }
    }

    async fn count_commits(&self, repo: &Path, range: &str) -> u32 {
        let spec = git(["rev-list", "--count", range], repo).timeout(self.settings.query_timeout());
        match self.runner.run(&spec).await {
            Ok(result) if result.success() => parse_count(&result.stdout),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::git::error::GitErrorKind;
    use crate::testing::{fail, fake_repository, ok, ScriptedRunner};

    fn service(runner: &Arc<ScriptedRunner>) -> (tempfile::TempDir, GitService) {
        let (dir, settings) = fake_repository();
        (dir, GitService::with_runner(settings, runner.clone()))
    }

    #[tokio::test]
    async fn status_reports_changes_and_branch() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on(&["git", "status"], ok(" M public/a.html\n?? public/b.html\n"))
            .on(&["git", "branch", "--show-current"], ok("master\n"));
        let (_dir, svc) = service(&runner);

        let status = svc.status().await.unwrap();
        assert!(!status.is_clean);
        assert_eq!(status.current_branch, "master");
        assert_eq!(status.changed_files.len(), 2);
        assert_eq!(status.changed_files[0].status, " M");
    }

    #[tokio::test]
    async fn status_branch_lookup_is_best_effort() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(&["git", "branch"], fail(128, "fatal: oops"));
        let (_dir, svc) = service(&runner);

        let status = svc.status().await.unwrap();
        assert!(status.is_clean);
        assert_eq!(status.current_branch, "unknown");
    }

    #[tokio::test]
    async fn status_command_failure_is_command_failed() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(&["git", "status"], fail(128, "fatal: index corrupt"));
        let (_dir, svc) = service(&runner);

        let err = svc.status().await.unwrap_err();
        assert_eq!(err.kind(), GitErrorKind::CommandFailed);
        assert!(err.to_string().contains("index corrupt"));
    }

    #[tokio::test]
    async fn status_on_missing_directory_runs_nothing() {
        let runner = Arc::new(ScriptedRunner::new());
        let svc = GitService::with_runner(
            crate::config::RepositorySettings::for_path("/definitely/not/here"),
            runner.clone(),
        );

        let err = svc.status().await.unwrap_err();
        assert_eq!(err.kind(), GitErrorKind::DirectoryNotFound);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn log_uses_limit_and_verbatim_format() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(
            &["git", "log"],
            ok("0123456789abcdef|Alice|a@x.com|2024-01-01 00:00:00 +0000|first | with bar\n"),
        );
        let (_dir, svc) = service(&runner);

        let commits = svc.log(Some(5)).await.unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].short_hash, "01234567");
        assert_eq!(commits[0].message, "first | with bar");

        let argv = &runner.calls()[0];
        assert_eq!(argv[1..], ["log", "-5", "--pretty=format:%H|%an|%ae|%ad|%s", "--date=iso"]);
    }

    #[tokio::test]
    async fn log_defaults_and_clamps_limit() {
        let runner = Arc::new(ScriptedRunner::new());
        let (_dir, svc) = service(&runner);

        svc.log(None).await.unwrap();
        svc.log(Some(100_000)).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0][2], "-15");
        assert_eq!(calls[1][2], "-200");
    }

    #[tokio::test]
    async fn log_rejects_zero_limit() {
        let runner = Arc::new(ScriptedRunner::new());
        let (_dir, svc) = service(&runner);

        let err = svc.log(Some(0)).await.unwrap_err();
        assert_eq!(err.kind(), GitErrorKind::InvalidArgument);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn branch_status_counts_against_remote() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on(&["git", "branch"], ok("master\n"))
            .on(&["git", "fetch"], fail(128, "could not resolve host"))
            .on(&["git", "ls-remote"], ok("abc\trefs/heads/master\n"))
            .on(&["git", "rev-list", "--count", "origin/master..master"], ok("2\n"))
            .on(&["git", "rev-list", "--count", "master..origin/master"], ok("garbage"));
        let (_dir, svc) = service(&runner);

        let status = svc.branch_status().await.unwrap();
        assert_eq!(
            status,
            BranchStatus {
                current_branch: "master".to_string(),
                has_remote: true,
                ahead: 2,
                behind: 0,
            }
        );
    }

    #[tokio::test]
    async fn branch_status_without_remote_is_zero() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .on(&["git", "branch"], ok("feature\n"))
            .on(&["git", "ls-remote"], ok(""))
            .on(&["git", "rev-list"], ok("7\n"));
        let (_dir, svc) = service(&runner);

        let status = svc.branch_status().await.unwrap();
        assert!(!status.has_remote);
        assert_eq!((status.ahead, status.behind), (0, 0));
        assert!(!runner.ran(&["git", "rev-list"]));
    }

    #[tokio::test]
    async fn branch_status_requires_current_branch() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(&["git", "branch"], fail(1, "fatal: not a git repository"));
        let (_dir, svc) = service(&runner);

        let err = svc.branch_status().await.unwrap_err();
        assert_eq!(err.kind(), GitErrorKind::CommandFailed);
        assert!(!runner.ran(&["git", "fetch"]));
    }

    #[tokio::test]
    async fn pull_refuses_dirty_tree() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(&["git", "status"], ok(" M a.html\n"));
        let (_dir, svc) = service(&runner);

        let err = svc.pull().await.unwrap_err();
        assert_eq!(err.kind(), GitErrorKind::DirtyWorkingTree);
        assert!(!runner.ran(&["git", "pull"]));
    }

    #[tokio::test]
    async fn pull_reports_output() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(&["git", "pull"], ok("Already up to date.\n"));
        let (_dir, svc) = service(&runner);

        let outcome = svc.pull().await.unwrap();
        assert_eq!(outcome.output, "Already up to date.\n");
    }

    #[tokio::test]
    async fn pull_failure_is_command_failed() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.on(&["git", "pull"], fail(1, "fatal: refusing to merge unrelated histories"));
        let (_dir, svc) = service(&runner);

        let err = svc.pull().await.unwrap_err();
        assert_eq!(err.kind(), GitErrorKind::CommandFailed);
        assert!(err.to_string().starts_with("git pull failed"));
    }
}
