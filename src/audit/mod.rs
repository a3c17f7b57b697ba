//! Audit trail for operations that change the repository.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::middleware::AuthUser;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub user_id: i64,
    pub username: String,
    pub action: String,
    pub resource_type: String,
    pub resource_name: String,
    pub details: String,
}

impl AuditEntry {
    pub fn git_pull(user: &AuthUser) -> Self {
        Self::git(user, "git_pull", "pulled latest code".to_string())
    }

    pub fn git_deploy(user: &AuthUser, commit_message: &str) -> Self {
        Self::git(user, "git_deploy", format!("deployed with commit message: {}", commit_message))
    }

    fn git(user: &AuthUser, action: &str, details: String) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            action: action.to_string(),
            resource_type: "git".to_string(),
            resource_name: "repository".to_string(),
            details,
        }
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError>;
}

/// Writes entries to the `operation_logs` table
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, AuditError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS operation_logs (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                username TEXT NOT NULL,
                action TEXT NOT NULL,
                resource_type TEXT NOT NULL,
                resource_name TEXT NOT NULL,
                details TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        sqlx::query(
            "INSERT INTO operation_logs \
             (user_id, username, action, resource_type, resource_name, details, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.user_id)
        .bind(&entry.username)
        .bind(&entry.action)
        .bind(&entry.resource_type)
        .bind(&entry.resource_name)
        .bind(&entry.details)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Audit entries go to the application log only
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        info!(
            target: "audit",
            user_id = entry.user_id,
            username = %entry.username,
            action = %entry.action,
            resource_type = %entry.resource_type,
            resource_name = %entry.resource_name,
            details = %entry.details,
            "operation recorded"
        );
        Ok(())
    }
}

/// Keeps entries in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(entry.clone());
        Ok(())
    }
}
