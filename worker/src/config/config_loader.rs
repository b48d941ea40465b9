use anyhow::{Context, Result};
use std::{env, str::FromStr};

use super::config_model::{Database, Dispatch, DotEnvyConfig, Smtp};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: required("DATABASE_URL")?,
        pool_size: optional("DATABASE_POOL_SIZE", 10)?,
    };

    let smtp = Smtp {
        host: required("SMTP_HOST")?,
        port: optional("SMTP_PORT", 587)?,
        username: env::var("SMTP_USER").ok().filter(|v| !v.is_empty()),
        password: env::var("SMTP_PASSWORD").ok().filter(|v| !v.is_empty()),
        from: required("SMTP_FROM")?,
        tls: env::var("SMTP_TLS").unwrap_or_else(|_| "starttls".to_string()),
        timeout: optional("SMTP_TIMEOUT", 10)?,
    };

    let dispatch = Dispatch {
        send_timeout: optional("MAIL_SEND_TIMEOUT", 20)?,
        poll_interval: optional("DISPATCH_POLL_INTERVAL", 60)?,
        max_failed_attempts: optional("DISPATCH_MAX_FAILED_ATTEMPTS", 3)?,
        batch_size: optional("DISPATCH_BATCH_SIZE", 50)?,
    };

    Ok(DotEnvyConfig {
        database,
        smtp,
        dispatch,
    })
}

fn required<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(key).with_context(|| format!("{key} is not set"))?;
    raw.trim()
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} is invalid")),
        _ => Ok(default),
    }
}
