use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub repository: RepositorySettings,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_request_logging: bool,
}

/// Where the managed front-end working copy lives and how it is published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySettings {
    pub path: PathBuf,
    pub remote: String,
    /// Branch holding the sources; deploy commits and pushes here first
    pub source_branch: String,
    /// Branch holding the published build output
    pub publish_branch: String,
    pub build_command: Vec<String>,
    /// Extra environment for the build, merged over the server's environment
    pub build_env: Vec<(String, String)>,
    /// Build output directory, relative to `path`
    pub build_output_dir: String,
    /// Backup of the build output kept across the branch switch, relative to `path`
    pub backup_dir: String,
    /// Limit for every deploy/pull command; `None` waits indefinitely
    pub command_timeout_secs: Option<u64>,
    /// Limit for read-only queries (status, log, branch status)
    pub query_timeout_secs: u64,
    pub default_log_limit: u32,
    pub max_log_limit: u32,
}

impl RepositorySettings {
    /// Settings for a working copy at `path` using the stock recipe
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            remote: "origin".to_string(),
            source_branch: "master".to_string(),
            publish_branch: "alpha".to_string(),
            build_command: vec!["npm".to_string(), "run".to_string(), "build".to_string()],
            // Node 17+ rejects the legacy OpenSSL hashes older webpack builds rely on
            build_env: vec![("NODE_OPTIONS".to_string(), "--openssl-legacy-provider".to_string())],
            build_output_dir: "dist".to_string(),
            backup_dir: "dist_backup".to_string(),
            command_timeout_secs: Some(900),
            query_timeout_secs: 30,
            default_log_limit: 15,
            max_log_limit: 200,
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(self.query_timeout_secs))
    }

    pub fn build_output_path(&self) -> PathBuf {
        self.path.join(&self.build_output_dir)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.join(&self.backup_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Audit log database; without it audit entries only go to the log
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_audit_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PROTOCOL_ADMIN_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("PROTOCOL_ADMIN_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // Repository overrides
        let repo = &mut self.repository;
        if let Ok(v) = env::var("FRONTEND_DIR") {
            repo.path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("GIT_REMOTE") {
            repo.remote = v;
        }
        if let Ok(v) = env::var("DEPLOY_SOURCE_BRANCH") {
            repo.source_branch = v;
        }
        if let Ok(v) = env::var("DEPLOY_PUBLISH_BRANCH") {
            repo.publish_branch = v;
        }
        if let Ok(v) = env::var("DEPLOY_BUILD_COMMAND") {
            let argv: Vec<String> = v.split_whitespace().map(str::to_string).collect();
            if !argv.is_empty() {
                repo.build_command = argv;
            }
        }
        if let Ok(v) = env::var("DEPLOY_BUILD_ENV") {
            repo.build_env = parse_key_values(&v);
        }
        if let Ok(v) = env::var("DEPLOY_BUILD_OUTPUT_DIR") {
            repo.build_output_dir = v;
        }
        if let Ok(v) = env::var("DEPLOY_BACKUP_DIR") {
            repo.backup_dir = v;
        }
        if let Ok(v) = env::var("DEPLOY_COMMAND_TIMEOUT_SECS") {
            // 0 disables the limit
            if let Ok(secs) = v.parse::<u64>() {
                repo.command_timeout_secs = (secs > 0).then_some(secs);
            }
        }
        if let Ok(v) = env::var("GIT_QUERY_TIMEOUT_SECS") {
            repo.query_timeout_secs = v.parse().unwrap_or(repo.query_timeout_secs);
        }
        if let Ok(v) = env::var("GIT_LOG_DEFAULT_LIMIT") {
            repo.default_log_limit = v.parse().unwrap_or(repo.default_log_limit);
        }
        if let Ok(v) = env::var("GIT_LOG_MAX_LIMIT") {
            repo.max_log_limit = v.parse().unwrap_or(repo.max_log_limit);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|url| !url.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }

        self
    }

    /// Reject configurations the server cannot safely start with
    pub fn validate(&self) -> Result<(), String> {
        if self.security.jwt_secret.is_empty() {
            return Err("JWT_SECRET must be set".to_string());
        }
        if self.repository.build_command.is_empty() {
            return Err("DEPLOY_BUILD_COMMAND must not be empty".to_string());
        }
        if self.repository.default_log_limit == 0 || self.repository.max_log_limit == 0 {
            return Err("git log limits must be positive".to_string());
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                enable_request_logging: true,
            },
            repository: RepositorySettings::for_path("../h5_miniapp"),
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "dev-secret-key-for-testing".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_audit_logging: true,
            },
        }
    }

    fn staging() -> Self {
        let mut repository = RepositorySettings::for_path("/srv/h5_miniapp");
        repository.command_timeout_secs = Some(1200);

        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                enable_request_logging: true,
            },
            repository,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_audit_logging: true,
            },
        }
    }

    fn production() -> Self {
        let mut repository = RepositorySettings::for_path("/srv/h5_miniapp");
        repository.command_timeout_secs = Some(1800);
        repository.max_log_limit = 100;

        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                enable_request_logging: false,
            },
            repository,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://admin.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
                enable_audit_logging: true,
            },
        }
    }
}

/// Parse `KEY=VALUE,KEY2=VALUE2`; entries without `=` are ignored
pub fn parse_key_values(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.validate().is_ok());
        assert_eq!(config.repository.source_branch, "master");
        assert_eq!(config.repository.publish_branch, "alpha");
        assert_eq!(config.repository.default_log_limit, 15);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_default_production_config_requires_secret() {
        let config = AppConfig::production();
        assert_eq!(config.validate(), Err("JWT_SECRET must be set".to_string()));
        assert_eq!(config.repository.command_timeout(), Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_request_logging_defaults_per_profile() {
        assert!(AppConfig::development().server.enable_request_logging);
        assert!(AppConfig::staging().server.enable_request_logging);
        assert!(!AppConfig::production().server.enable_request_logging);
    }

    #[test]
    fn test_repository_paths_are_relative_to_working_copy() {
        let repo = RepositorySettings::for_path("/srv/site");
        assert_eq!(repo.build_output_path(), PathBuf::from("/srv/site/dist"));
        assert_eq!(repo.backup_path(), PathBuf::from("/srv/site/dist_backup"));
        assert_eq!(repo.build_command, vec!["npm", "run", "build"]);
        assert_eq!(
            repo.build_env,
            vec![("NODE_OPTIONS".to_string(), "--openssl-legacy-provider".to_string())]
        );
    }

    #[test]
    fn test_parse_key_values() {
        assert_eq!(
            parse_key_values("NODE_OPTIONS=--openssl-legacy-provider, CI = true,broken,=x"),
            vec![
                ("NODE_OPTIONS".to_string(), "--openssl-legacy-provider".to_string()),
                ("CI".to_string(), "true".to_string()),
            ]
        );
        assert!(parse_key_values("").is_empty());
    }
}
