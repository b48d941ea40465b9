use std::time::Duration;

use crates::infra::mail::smtp::{SmtpConfig, SmtpTls};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: Auth,
    pub smtp: Smtp,
    pub dispatch: Dispatch,
    pub detail_cache: DetailCache,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Smtp {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub tls: String,
    pub timeout: u64,
}

impl Smtp {
    pub fn transport_config(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            tls: SmtpTls::from_setting(&self.tls),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dispatch {
    /// Seconds allowed for one transport call.
    pub send_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct DetailCache {
    pub ttl: u64,
}
