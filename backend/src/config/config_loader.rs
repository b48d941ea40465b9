use anyhow::{Context, Result, bail};
use std::{env, str::FromStr};

use super::config_model::{
    Auth, BackendServer, Database, DetailCache, Dispatch, DotEnvyConfig, Smtp,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?,
        body_limit: required("SERVER_BODY_LIMIT")?,
        timeout: required("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        pool_size: optional("DATABASE_POOL_SIZE", 10)?,
    };

    let auth = Auth {
        jwt_secret: required("JWT_SECRET")?,
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
    };

    ensure_send_fits_request(dispatch.send_timeout, backend_server.timeout)?;

    let detail_cache = DetailCache {
        ttl: optional("DETAIL_CACHE_TTL", 60)?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        smtp,
        dispatch,
        detail_cache,
    })
}

/// A manual dispatch answers inside one request, so the transport bound must leave room
/// for the lookup and the writes before `SERVER_TIMEOUT` cuts the response.
fn ensure_send_fits_request(send_timeout: u64, server_timeout: u64) -> Result<()> {
    if send_timeout >= server_timeout {
        bail!(
            "MAIL_SEND_TIMEOUT ({send_timeout}s) must be lower than SERVER_TIMEOUT ({server_timeout}s)"
        );
    }
    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_timeout_below_server_timeout_is_accepted() {
        assert!(ensure_send_fits_request(20, 30).is_ok());
    }

    #[test]
    fn send_timeout_not_below_server_timeout_is_rejected() {
        let err = ensure_send_fits_request(30, 30).unwrap_err();

        assert_eq!(
            err.to_string(),
            "MAIL_SEND_TIMEOUT (30s) must be lower than SERVER_TIMEOUT (30s)"
        );
        assert!(ensure_send_fits_request(45, 30).is_err());
    }
}
