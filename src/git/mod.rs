//! Git service: read-only repository queries, pull, and the deploy workflow.

pub mod deploy;
pub mod error;
pub mod guard;
mod inspect;
pub mod lock;
pub mod parse;
pub mod runner;
pub mod service;
pub mod types;

pub use deploy::{DeployOrchestrator, DeployPlan, FailurePolicy};
pub use error::{GitError, GitErrorKind, GitResult};
pub use guard::ensure_repository;
pub use lock::{RepositoryGuard, RepositoryLocks};
pub use runner::{CommandRunner, CommandSpec, SystemRunner};
pub use service::GitService;
pub use types::{
    BranchStatus, ChangeEntry, CommandResult, CommitRecord, DeployReport, DeployStep, PullOutcome, StatusReport,
    StepStatus,
};
