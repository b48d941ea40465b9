use std::time::Duration;

use crates::infra::mail::smtp::{SmtpConfig, SmtpTls};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub smtp: Smtp,
    pub dispatch: Dispatch,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
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
    pub send_timeout: u64,
    pub poll_interval: u64,
    pub max_failed_attempts: i64,
    pub batch_size: i64,
}
