use anyhow::Result;
use backend::{axum_http::http_serve, config::config_loader};
use crates::infra::db::postgres::postgres_connection;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("backend: exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let config = Arc::new(config_loader::load()?);
    info!(
        port = config.backend_server.port,
        smtp_host = %config.smtp.host,
        "backend: configuration loaded"
    );

    let db_pool = Arc::new(postgres_connection::establish_connection(
        &config.database.url,
        config.database.pool_size,
    )?);
    info!(pool_size = config.database.pool_size, "backend: postgres pool established");

    http_serve::start(config, db_pool).await
}
