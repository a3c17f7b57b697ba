use serde::{Deserialize, Serialize};

/// Exit code and captured output of one external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr, for human-readable step output
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}{}", self.stdout, self.stderr)
        }
    }

    /// Diagnostic summary used in failure messages.
    ///
    /// Falls back to `default` only when there is nothing at all to report.
    pub fn describe_failure(&self, default: &str) -> String {
        let mut details = Vec::new();
        if !self.stderr.is_empty() {
            details.push(format!("stderr: {}", self.stderr));
        }
        if !self.stdout.is_empty() {
            details.push(format!("stdout: {}", self.stdout));
        }
        if self.exit_code != 0 {
            details.push(format!("exit code: {}", self.exit_code));
        }

        if details.is_empty() {
            default.to_string()
        } else {
            details.join(" | ")
        }
    }
}

/// One line of `git status --porcelain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Two-character status code, kept verbatim (`" M"` and `"M "` differ)
    pub status: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub is_clean: bool,
    pub current_branch: String,
    pub changed_files: Vec<ChangeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    #[serde(rename = "hash")]
    pub short_hash: String,
    pub full_hash: String,
    pub author: String,
    pub email: String,
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStatus {
    pub current_branch: String,
    pub has_remote: bool,
    /// Commits on the local branch missing from the remote branch
    pub ahead: u32,
    /// Commits on the remote branch missing from the local branch
    pub behind: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullOutcome {
    pub message: String,
    pub output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    /// Non-zero exit that the deploy recipe tolerates
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployStep {
    #[serde(rename = "step")]
    pub name: String,
    pub status: StepStatus,
    pub output: String,
}

impl DeployStep {
    pub fn new(name: impl Into<String>, status: StepStatus, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            output: output.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployReport {
    pub message: String,
    pub steps: Vec<DeployStep>,
}
