//! Build-and-publish workflow.
//!
//! A deploy commits and pushes the source branch, builds it, carries the build
//! output across a switch to the publish branch, commits and pushes it there,
//! and switches back. The sequence is a fixed [`DeployPlan`]; each planned
//! step has a [`FailurePolicy`] that alone decides whether a failure aborts
//! the run or is recorded as a warning.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::RepositorySettings;

use super::error::{GitError, GitResult};
use super::guard::ensure_repository;
use super::runner::{git, CommandRunner, CommandSpec};
use super::service::GitService;
use super::types::{CommandResult, DeployReport, DeployStep, StepStatus};

/// What a failed step means for the rest of the deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the deploy
    Fatal,
    /// Record a warning and continue
    Tolerated,
    /// Warning when git reports there was nothing to commit, fatal otherwise
    TolerateNothingToCommit,
}

/// Decision for one finished step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Record(StepStatus),
    Abort,
}

impl FailurePolicy {
    pub fn resolve(self, result: &CommandResult) -> Resolution {
        if result.success() {
            return Resolution::Record(StepStatus::Success);
        }
        match self {
            FailurePolicy::Fatal => Resolution::Abort,
            FailurePolicy::Tolerated => Resolution::Record(StepStatus::Warning),
            FailurePolicy::TolerateNothingToCommit if is_nothing_to_commit(result) => {
                Resolution::Record(StepStatus::Warning)
            }
            FailurePolicy::TolerateNothingToCommit => Resolution::Abort,
        }
    }
}

/// `git commit` exits 1 with one of these when the index matches HEAD
fn is_nothing_to_commit(result: &CommandResult) -> bool {
    let output = result.combined_output();
    ["nothing to commit", "nothing added to commit", "no changes added to commit"]
        .iter()
        .any(|needle| output.contains(needle))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Command(CommandSpec),
    /// Like `Command`, but the invocation itself is part of the step output
    Build(CommandSpec),
    /// Copy the build output to the backup directory
    BackupOutput,
    /// Replace the build output with the backup
    RestoreOutput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub name: String,
    pub action: StepAction,
    pub policy: FailurePolicy,
    /// Step output when the command printed nothing
    pub quiet_output: &'static str,
}

impl PlannedStep {
    fn new(name: impl Into<String>, action: StepAction, policy: FailurePolicy, quiet_output: &'static str) -> Self {
        Self {
            name: name.into(),
            action,
            policy,
            quiet_output,
        }
    }
}

/// The fixed deploy recipe, resolved against one repository
#[derive(Debug, Clone)]
pub struct DeployPlan {
    steps: Vec<PlannedStep>,
    output_dir: PathBuf,
    backup_dir: PathBuf,
}

impl DeployPlan {
    pub fn new(settings: &RepositorySettings, repo: &Path, commit_message: &str) -> Self {
        let remote = settings.remote.as_str();
        let source = settings.source_branch.as_str();
        let publish = settings.publish_branch.as_str();
        let output_dir = settings.build_output_dir.as_str();
        let command_timeout = settings.command_timeout();

        let cmd = |args: &[&str]| StepAction::Command(git(args.iter().copied(), repo).timeout(command_timeout));

        let mut build = CommandSpec::new(settings.build_command.iter().cloned(), repo).timeout(command_timeout);
        for (key, value) in &settings.build_env {
            build = build.env(key.clone(), value.clone());
        }

        use FailurePolicy::*;
        let steps = vec![
            PlannedStep::new("git add", cmd(&["add", "."]), Fatal, "staged"),
            PlannedStep::new(
                "git commit",
                cmd(&["commit", "-m", commit_message]),
                TolerateNothingToCommit,
                "committed",
            ),
            PlannedStep::new(format!("git push {remote} {source}"), cmd(&["push", remote, source]), Fatal, "pushed"),
            PlannedStep::new(settings.build_command.join(" "), StepAction::Build(build), Fatal, "build succeeded"),
            PlannedStep::new(format!("backup {output_dir}"), StepAction::BackupOutput, Fatal, ""),
            PlannedStep::new(format!("git checkout {publish}"), cmd(&["checkout", publish]), Fatal, "switched"),
            PlannedStep::new(format!("git pull {remote} {publish}"), cmd(&["pull", remote, publish]), Fatal, "pulled"),
            PlannedStep::new(format!("replace {output_dir}"), StepAction::RestoreOutput, Fatal, ""),
            PlannedStep::new(format!("git add {output_dir}"), cmd(&["add", output_dir]), Fatal, "staged"),
            PlannedStep::new(
                format!("git commit ({publish})"),
                cmd(&["commit", "-m", commit_message]),
                Tolerated,
                "nothing to commit, skipped",
            ),
            PlannedStep::new(format!("git push {remote} {publish}"), cmd(&["push", remote, publish]), Fatal, "pushed"),
            PlannedStep::new(format!("git checkout {source}"), cmd(&["checkout", source]), Tolerated, "switched"),
        ];

        Self {
            steps,
            output_dir: settings.build_output_path(),
            backup_dir: settings.backup_path(),
        }
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}

/// Outcome of executing one step, before its policy is applied
enum Executed {
    Command { result: CommandResult, header: Option<String> },
    Filesystem(String),
}

/// Runs a [`DeployPlan`] step by step, keeping the trace of finished steps
pub struct DeployOrchestrator<'a> {
    runner: &'a dyn CommandRunner,
    trace: Vec<DeployStep>,
}

impl<'a> DeployOrchestrator<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            trace: Vec::new(),
        }
    }

    /// Execute every step in order.
    ///
    /// On a fatal failure the error carries the trace completed so far and the
    /// backup directory is left in place for inspection. Once the last step
    /// has run, the backup is removed whatever the warnings.
    pub async fn run(mut self, plan: &DeployPlan) -> GitResult<Vec<DeployStep>> {
        for step in plan.steps() {
            let executed = match self.execute(step, plan).await {
                Ok(executed) => executed,
                Err(e) => {
                    error!(step = %step.name, error = %e, "deploy step could not run");
                    return Err(e.with_steps(self.trace));
                }
            };
            self.apply(step, executed)?;
        }

        if let Err(e) = remove_dir_if_exists(plan.backup_dir.clone()).await {
            warn!(path = %plan.backup_dir.display(), error = %e, "failed to remove deploy backup");
        }

        Ok(self.trace)
    }

    async fn execute(&self, step: &PlannedStep, plan: &DeployPlan) -> GitResult<Executed> {
        match &step.action {
            StepAction::Command(spec) => Ok(Executed::Command {
                result: self.runner.run(spec).await?,
                header: None,
            }),
            StepAction::Build(spec) => Ok(Executed::Command {
                result: self.runner.run(spec).await?,
                header: Some(describe_invocation(spec)),
            }),
            StepAction::BackupOutput => {
                let output = plan.output_dir.clone();
                let backup = plan.backup_dir.clone();
                if !output.is_dir() {
                    return Ok(Executed::Filesystem(format!(
                        "build output directory {} does not exist, the build may have failed",
                        output.display()
                    )));
                }
                Ok(match backup_output(output, backup.clone()).await {
                    Ok(()) => Executed::Command {
                        result: success_with(&backup.display().to_string()),
                        header: None,
                    },
                    Err(e) => Executed::Filesystem(format!("failed to back up build output: {e}")),
                })
            }
            StepAction::RestoreOutput => {
                Ok(match restore_output(plan.backup_dir.clone(), plan.output_dir.clone()).await {
                    Ok(()) => Executed::Command {
                        result: success_with("replaced"),
                        header: None,
                    },
                    Err(e) => Executed::Filesystem(format!("failed to replace build output: {e}")),
                })
            }
        }
    }

    fn apply(&mut self, step: &PlannedStep, executed: Executed) -> GitResult<()> {
        let (result, header) = match executed {
            Executed::Command { result, header } => (result, header),
            Executed::Filesystem(detail) => {
                error!(step = %step.name, "{detail}");
                return Err(GitError::CommandFailed {
                    message: format!("{} failed: {detail}", step.name),
                    exit_code: None,
                    output: detail,
                    steps: std::mem::take(&mut self.trace),
                });
            }
        };
        let with_header = |body: String| match &header {
            Some(header) => format!("{header}\n\n{body}"),
            None => body,
        };

        match step.policy.resolve(&result) {
            Resolution::Record(StepStatus::Success) => {
                let output = Some(result.combined_output())
                    .filter(|o| !o.is_empty())
                    .unwrap_or_else(|| step.quiet_output.to_string());
                info!(step = %step.name, "deploy step succeeded");
                self.trace.push(DeployStep::new(&step.name, StepStatus::Success, with_header(output)));
                Ok(())
            }
            Resolution::Record(StepStatus::Warning) => {
                let output = result.describe_failure(step.quiet_output);
                warn!(step = %step.name, exit_code = result.exit_code, "deploy step failed, continuing");
                self.trace.push(DeployStep::new(&step.name, StepStatus::Warning, with_header(output)));
                Ok(())
            }
            Resolution::Abort => {
                let detail = with_header(result.describe_failure("unknown error"));
                error!(step = %step.name, exit_code = result.exit_code, "deploy step failed, aborting");
                Err(GitError::CommandFailed {
                    message: format!("{} failed: {detail}", step.name),
                    exit_code: Some(result.exit_code),
                    output: result.combined_output(),
                    steps: std::mem::take(&mut self.trace),
                })
            }
        }
    }
}

impl GitService {
    /// Run the full build-and-publish workflow with `commit_message`
    pub async fn deploy(&self, commit_message: &str) -> GitResult<DeployReport> {
        if commit_message.trim().is_empty() {
            return Err(GitError::InvalidArgument(
                "commit message must not be empty".to_string(),
            ));
        }

        let repo = ensure_repository(&self.settings.path)?;
        let _lock = self.locks.try_acquire(&repo)?;

        info!(repo = %repo.display(), "starting deploy");
        let plan = DeployPlan::new(&self.settings, &repo, commit_message);
        let steps = DeployOrchestrator::new(self.runner.as_ref()).run(&plan).await?;

        let warnings = steps.iter().filter(|s| s.status == StepStatus::Warning).count();
        info!(steps = steps.len(), warnings, "deploy finished");

        Ok(DeployReport {
            message: "Deploy succeeded".to_string(),
            steps,
        })
    }
}

fn success_with(stdout: &str) -> CommandResult {
    CommandResult {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn describe_invocation(spec: &CommandSpec) -> String {
    let env = spec
        .env
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "command: {}\nworking directory: {}\nenvironment: {}",
        spec.display(),
        spec.cwd.display(),
        if env.is_empty() { "(inherited)" } else { env.as_str() }
    )
}

async fn backup_output(output: PathBuf, backup: PathBuf) -> io::Result<()> {
    blocking(move || {
        if backup.exists() {
            std::fs::remove_dir_all(&backup)?;
        }
        copy_dir(&output, &backup)
    })
    .await
}

async fn restore_output(backup: PathBuf, output: PathBuf) -> io::Result<()> {
    blocking(move || {
        if output.exists() {
            std::fs::remove_dir_all(&output)?;
        }
        copy_dir(&backup, &output)
    })
    .await
}

async fn remove_dir_if_exists(path: PathBuf) -> io::Result<()> {
    blocking(move || {
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        Ok(())
    })
    .await
}

async fn blocking<F>(f: F) -> io::Result<()>
where
    F: FnOnce() -> io::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}

/// Recursive copy; symlinks are followed and their targets copied
fn copy_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if std::fs::metadata(&path)?.is_dir() {
            copy_dir(&path, &target)?;
        } else {
            std::fs::copy(&path, &target)?;
        }
    }
    Ok(())
}
