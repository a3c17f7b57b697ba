use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::RepositorySettings;
use crate::git::{CommandResult, CommandRunner, CommandSpec, GitResult};

type Handler = Box<dyn Fn(&CommandSpec) -> GitResult<CommandResult> + Send + Sync>;

struct Rule {
    prefix: Vec<String>,
    handler: Handler,
}

/// Command runner that answers from scripted rules instead of spawning processes.
///
/// Rules match on an argv prefix; the most recently added match wins, and
/// unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, prefix: &[&str], result: CommandResult) -> &Self {
        self.on_with(prefix, move |_| Ok(result.clone()))
    }

    pub fn on_with<F>(&self, prefix: &[&str], handler: F) -> &Self
    where
        F: Fn(&CommandSpec) -> GitResult<CommandResult> + Send + Sync + 'static,
    {
        self.rules.lock().unwrap().push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            handler: Box::new(handler),
        });
        self
    }

    /// Every argv that was run, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().iter().map(|c| c.argv.clone()).collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ran(&self, prefix: &[&str]) -> bool {
        self.calls().iter().any(|argv| starts_with(argv, prefix))
    }
}

fn starts_with(argv: &[String], prefix: &[impl AsRef<str>]) -> bool {
    argv.len() >= prefix.len() && argv.iter().zip(prefix).all(|(a, p)| a == p.as_ref())
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> GitResult<CommandResult> {
        self.calls.lock().unwrap().push(spec.clone());

        let rules = self.rules.lock().unwrap();
        match rules.iter().rev().find(|rule| starts_with(&spec.argv, &rule.prefix)) {
            Some(rule) => (rule.handler)(spec),
            None => Ok(ok("")),
        }
    }
}

pub fn ok(stdout: &str) -> CommandResult {
    CommandResult {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn fail(exit_code: i32, stderr: &str) -> CommandResult {
    CommandResult {
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// A directory that passes the repository guard, with settings pointing at it
pub fn fake_repository() -> (tempfile::TempDir, RepositorySettings) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join(".git")).expect("create .git");
    let settings = RepositorySettings::for_path(dir.path());
    (dir, settings)
}

/// Write a small build output tree under `root/dist`
pub fn write_build_output(root: &Path, marker: &str) {
    let dist = root.join("dist");
    std::fs::create_dir_all(dist.join("static")).expect("create dist");
    std::fs::write(dist.join("index.html"), marker).expect("write index");
    std::fs::write(dist.join("static").join("app.js"), "console.log(1)").expect("write asset");
}
