//! External command execution.
//!
//! Commands are always spawned from an explicit argument vector. Nothing is
//! passed through a shell unless the platform requires it for script shims
//! (`npm` is `npm.cmd` on Windows), and even then only when no argument holds
//! a character the shell would rewrite.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::error::{GitError, GitResult};
use super::types::CommandResult;

/// Characters that `cmd.exe` expands or treats as operators
const SHELL_SPECIAL: &[char] = &['%', '^', '&', '|', '<', '>', '!', '"'];

/// A fully described command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Option<Duration>,
    /// Merged over the inherited process environment
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new<I, S>(argv: I, cwd: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: cwd.into(),
            timeout: None,
            env: Vec::new(),
        }
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    /// Space-joined argv, for logs and step output
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// True when some argument must reach the program byte-for-byte and so
/// must never be routed through a command shell.
pub fn needs_verbatim_args(argv: &[String]) -> bool {
    argv.iter().any(|arg| arg.contains(SHELL_SPECIAL))
}

/// Seam between the git service and the operating system
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion. A non-zero exit code is a normal result;
    /// only failing to run the command at all is an error.
    async fn run(&self, spec: &CommandSpec) -> GitResult<CommandResult>;
}

/// Runs commands as real child processes on the tokio runtime
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn build_command(spec: &CommandSpec) -> Command {
        #[cfg(windows)]
        {
            if !needs_verbatim_args(&spec.argv) {
                let mut cmd = Command::new("cmd");
                cmd.arg("/C").args(&spec.argv);
                return cmd;
            }
        }

        let mut cmd = Command::new(&spec.argv[0]);
        cmd.args(&spec.argv[1..]);
        cmd
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> GitResult<CommandResult> {
        if spec.argv.is_empty() {
            return Err(GitError::InvalidArgument("empty command".to_string()));
        }
        let program = spec.program().to_string();

        let mut cmd = Self::build_command(spec);
        cmd.current_dir(&spec.cwd)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            command = %spec.display(),
            cwd = %spec.cwd.display(),
            timeout_secs = spec.timeout.map(|t| t.as_secs()),
            "spawning command"
        );

        let child = cmd.spawn().map_err(|e| spawn_error(&program, e))?;

        let output = match spec.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| GitError::Timeout {
                    program: program.clone(),
                    timeout: limit,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| spawn_error(&program, e))?;

        let result = CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(command = %spec.display(), exit_code = result.exit_code, "command finished");
        Ok(result)
    }
}

fn spawn_error(program: &str, err: std::io::Error) -> GitError {
    if err.kind() == std::io::ErrorKind::NotFound {
        GitError::ToolNotFound {
            program: program.to_string(),
        }
    } else {
        GitError::Spawn {
            program: program.to_string(),
            source: err,
        }
    }
}

/// Convenience for building git invocations rooted at a working copy.
///
/// Messages are pinned to the C locale; callers match on git's English
/// output ("nothing to commit").
pub(crate) fn git<I, S>(args: I, cwd: &Path) -> CommandSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let argv = std::iter::once("git".to_string()).chain(args.into_iter().map(Into::into));
    CommandSpec::new(argv, cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("LC_ALL", "C")
        .env("LANGUAGE", "C")
}
