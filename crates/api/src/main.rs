use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use bizops_api::app::{self, Backends};
use bizops_api::config::ApiConfig;
use bizops_api::demo;
use bizops_auth::InMemoryAccountDirectory;
use bizops_reporting::InMemoryRecordStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    bizops_observability::init(config.log_format);

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let records = Arc::new(InMemoryRecordStore::new());
    let accounts = Arc::new(InMemoryAccountDirectory::new());
    if config.environment.is_development() {
        demo::seed(&records, &accounts, Utc::now());
    }

    let app = app::build_app(&config, Backends::new(records, accounts)).await;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        environment = ?config.environment,
        rate_limit_max = config.rate_limit.max_requests,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
