use std::sync::Arc;

use crate::audit::AuditSink;
use crate::auth::AuthKeys;
use crate::git::GitService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub git: Arc<GitService>,
    pub audit: Arc<dyn AuditSink>,
    pub auth: AuthKeys,
}

impl AppState {
    pub fn new(git: GitService, audit: Arc<dyn AuditSink>, auth: AuthKeys) -> Self {
        Self {
            git: Arc::new(git),
            audit,
            auth,
        }
    }
}
