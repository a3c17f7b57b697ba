// handlers/protected/git/mod.rs - /api/git/*
pub mod branch_status;
pub mod deploy;
pub mod log;
pub mod pull;
pub mod status;

pub use branch_status::branch_status_get;
pub use deploy::deploy_post;
pub use log::log_get;
pub use pull::pull_post;
pub use status::status_get;

use crate::auth::Role;

/// Roles allowed to change the repository
pub const WRITE_ROLES: &[Role] = &[Role::Admin, Role::Editor];
