use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use protocol_admin::audit::{AuditSink, PgAuditSink, TracingAuditSink};
use protocol_admin::auth::AuthKeys;
use protocol_admin::config::AppConfig;
use protocol_admin::git::GitService;
use protocol_admin::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up FRONTEND_DIR, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = protocol_admin::config::config();
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;
    tracing::info!(
        environment = ?config.environment,
        repository = %config.repository.path.display(),
        "Starting Protocol Admin"
    );

    let state = AppState::new(
        GitService::new(config.repository.clone()),
        audit_sink(config).await?,
        AuthKeys::from_config(&config.security)?,
    );

    let mut app = protocol_admin::app(state);
    if let Some(trace) = protocol_admin::trace_layer(&config.server) {
        app = app.layer(trace);
    }
    if let Some(cors) = protocol_admin::cors_layer(&config.security) {
        app = app.layer(cors);
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Protocol Admin listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn audit_sink(config: &AppConfig) -> anyhow::Result<Arc<dyn AuditSink>> {
    if !config.security.enable_audit_logging {
        return Ok(Arc::new(TracingAuditSink));
    }

    match &config.database.url {
        Some(url) => {
            let sink = PgAuditSink::connect(url, &config.database)
                .await
                .context("failed to connect to the audit database")?;
            sink.ensure_schema().await.context("failed to prepare operation_logs")?;
            tracing::info!("audit entries are written to operation_logs");
            Ok(Arc::new(sink))
        }
        None => {
            tracing::info!("DATABASE_URL not set, audit entries go to the log only");
            Ok(Arc::new(TracingAuditSink))
        }
    }
}
