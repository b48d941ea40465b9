use anyhow::Result;
use crates::{
    application::usecases::mailing_dispatch::{DispatchSettings, MailingDispatchUseCase},
    infra::{
        db::{
            postgres::postgres_connection,
            repositories::{mailing_attempts::MailingAttemptPostgres, mailings::MailingPostgres},
        },
        mail::smtp::SmtpMailTransport,
    },
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};
use worker::{
    config,
    services::dispatch_loop::{self, DispatchLoopSettings},
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("worker: exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = config::config_loader::load()?;
    info!("worker: configuration loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.pool_size,
    )?;
    info!(pool_size = dotenvy_env.database.pool_size, "worker: postgres pool established");

    let db_pool_arc = Arc::new(postgres_pool);

    let mailing_repository = Arc::new(MailingPostgres::new(Arc::clone(&db_pool_arc)));
    let attempt_repository = Arc::new(MailingAttemptPostgres::new(Arc::clone(&db_pool_arc)));
    let transport = Arc::new(SmtpMailTransport::new(dotenvy_env.smtp.transport_config())?);

    let dispatcher = Arc::new(MailingDispatchUseCase::new(
        Arc::clone(&mailing_repository),
        attempt_repository,
        transport,
        DispatchSettings {
            sender: dotenvy_env.smtp.from.clone(),
            send_timeout: Duration::from_secs(dotenvy_env.dispatch.send_timeout),
        },
    ));

    let settings = DispatchLoopSettings {
        poll_interval: Duration::from_secs(dotenvy_env.dispatch.poll_interval),
        max_failed_attempts: dotenvy_env.dispatch.max_failed_attempts,
        batch_size: dotenvy_env.dispatch.batch_size,
    };

    let dispatch_loop = tokio::spawn(dispatch_loop::run_dispatch_loop(
        mailing_repository,
        dispatcher,
        settings,
    ));

    tokio::select! {
        result = dispatch_loop => result??,
        _ = tokio::signal::ctrl_c() => info!("worker: ctrl+c received, stopping"),
    };

    Ok(())
}
