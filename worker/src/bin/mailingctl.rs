use anyhow::Result;
use clap::Parser;
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
use std::{process::ExitCode, sync::Arc, time::Duration};
use tracing::error;
use worker::{
    cli::{Cli, Operator},
    config,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            error!("mailingctl exited with error: {:#}", error);
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("mailingctl")?;

    let dotenvy_env = config::config_loader::load()?;

    let db_pool = Arc::new(postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        // One command, one connection.
        1,
    )?);
    let mailing_repository = Arc::new(MailingPostgres::new(Arc::clone(&db_pool)));
    let attempt_repository = Arc::new(MailingAttemptPostgres::new(Arc::clone(&db_pool)));
    let transport = Arc::new(SmtpMailTransport::new(dotenvy_env.smtp.transport_config())?);

    let dispatcher = MailingDispatchUseCase::new(
        Arc::clone(&mailing_repository),
        Arc::clone(&attempt_repository),
        transport,
        DispatchSettings {
            sender: dotenvy_env.smtp.from.clone(),
            send_timeout: Duration::from_secs(dotenvy_env.dispatch.send_timeout),
        },
    );

    let operator = Operator::new(mailing_repository, attempt_repository, dispatcher);
    let output = operator.execute(cli.command).await?;

    for line in &output.lines {
        if output.success {
            println!("{line}");
        } else {
            eprintln!("{line}");
        }
    }

    Ok(output.success)
}
