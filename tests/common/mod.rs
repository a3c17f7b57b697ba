#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tempfile::TempDir;

use protocol_admin::config::RepositorySettings;

/// Writes a one-file site into `dist/`
pub const BUILD_SCRIPT: &str = "mkdir -p dist && echo built > dist/index.html";

/// A working copy with `master` and `alpha` pushed to a local bare remote.
///
/// `master` ignores the build output; `alpha` tracks it, the way the
/// published branch does in production.
pub struct GitFixture {
    dir: TempDir,
    pub work: PathBuf,
    pub remote: PathBuf,
}

impl GitFixture {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let remote = dir.path().join("remote.git");
        let work = dir.path().join("site");

        git_in(dir.path(), &["init", "--bare", "remote.git"])?;
        git_in(&remote, &["symbolic-ref", "HEAD", "refs/heads/master"])?;

        git_in(dir.path(), &["init", "site"])?;
        git_in(&work, &["symbolic-ref", "HEAD", "refs/heads/master"])?;
        configure_identity(&work)?;
        git_in(&work, &["remote", "add", "origin", path_str(&remote)?])?;

        std::fs::write(work.join(".gitignore"), "dist/\ndist_backup/\n")?;
        std::fs::write(work.join("index.html"), "<h1>protocol</h1>\n")?;
        git_in(&work, &["add", "."])?;
        git_in(&work, &["commit", "-m", "initial"])?;
        git_in(&work, &["push", "-u", "origin", "master"])?;

        git_in(&work, &["checkout", "-b", "alpha"])?;
        std::fs::write(work.join(".gitignore"), "dist_backup/\n")?;
        git_in(&work, &["commit", "-am", "track build output"])?;
        git_in(&work, &["push", "-u", "origin", "alpha"])?;
        git_in(&work, &["checkout", "master"])?;

        Ok(Self { dir, work, remote })
    }

    /// Stock settings pointed at the fixture with a shell build instead of npm
    pub fn settings(&self) -> RepositorySettings {
        let mut settings = RepositorySettings::for_path(&self.work);
        settings.build_command = vec!["sh".to_string(), "-c".to_string(), BUILD_SCRIPT.to_string()];
        settings.command_timeout_secs = Some(60);
        settings
    }

    pub fn settings_with_build(&self, script: &str) -> RepositorySettings {
        let mut settings = self.settings();
        settings.build_command = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        settings
    }

    pub fn write(&self, name: &str, contents: &str) -> Result<()> {
        std::fs::write(self.work.join(name), contents)?;
        Ok(())
    }

    pub fn commit_all(&self, message: &str) -> Result<()> {
        git_in(&self.work, &["add", "."])?;
        git_in(&self.work, &["commit", "-m", message])?;
        Ok(())
    }

    /// Push a commit to `master` from a second clone, leaving `work` behind
    pub fn push_from_other_clone(&self, file: &str, message: &str) -> Result<()> {
        let other = self.dir.path().join("other");
        if !other.exists() {
            git_in(self.dir.path(), &["clone", path_str(&self.remote)?, "other"])?;
            configure_identity(&other)?;
        }
        git_in(&other, &["checkout", "master"])?;
        git_in(&other, &["pull", "origin", "master"])?;
        std::fs::write(other.join(file), message)?;
        git_in(&other, &["add", "."])?;
        git_in(&other, &["commit", "-m", message])?;
        git_in(&other, &["push", "origin", "master"])?;
        Ok(())
    }

    pub fn current_branch(&self) -> Result<String> {
        Ok(git_in(&self.work, &["branch", "--show-current"])?.trim().to_string())
    }

    /// File contents at `branch` in the bare remote
    pub fn remote_file(&self, branch: &str, path: &str) -> Result<String> {
        git_in(&self.remote, &["show", &format!("{}:{}", branch, path)])
    }

    pub fn remote_commit_count(&self, branch: &str) -> Result<u32> {
        Ok(git_in(&self.remote, &["rev-list", "--count", branch])?.trim().parse()?)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn configure_identity(repo: &Path) -> Result<()> {
    git_in(repo, &["config", "user.email", "tests@example.com"])?;
    git_in(repo, &["config", "user.name", "Protocol Tests"])?;
    git_in(repo, &["config", "commit.gpgsign", "false"])?;
    git_in(repo, &["config", "pull.rebase", "false"])?;
    Ok(())
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().context("temp path is not valid UTF-8")
}

/// Run git synchronously and return stdout, failing on non-zero exit
pub fn git_in(cwd: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .with_context(|| format!("failed to spawn git {:?}", args))?;

    if !output.status.success() {
        bail!(
            "git {:?} failed in {}: {}",
            args,
            cwd.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
