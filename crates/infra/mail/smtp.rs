use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::debug;

use crate::domain::{
    repositories::mail_transport::MailTransport,
    value_objects::mail::{OutgoingEmail, TransportError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpTls {
    StartTls,
    Tls,
    None,
}

impl SmtpTls {
    /// Unknown values fall back to STARTTLS.
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tls" => Self::Tls,
            "none" => Self::None,
            _ => Self::StartTls,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: SmtpTls,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct SmtpMailTransport {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailTransport {
    pub fn new(config: SmtpConfig) -> Result<Self, TransportError> {
        let mut builder = match config.tls {
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| TransportError::Smtp(e.to_string()))?,
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| TransportError::Smtp(e.to_string()))?,
        };

        builder = builder.port(config.port).timeout(Some(config.timeout));

        if let (Some(username), Some(password)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: Arc::new(builder.build()),
        })
    }
}

/// Builds a single plain-text message addressed to every recipient.
pub fn build_message(email: &OutgoingEmail) -> Result<Message, TransportError> {
    let from: Mailbox = email
        .sender
        .parse()
        .map_err(|_| TransportError::InvalidAddress(email.sender.clone()))?;

    let mut builder = Message::builder()
        .from(from)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    for recipient in &email.recipients {
        let mailbox: Mailbox = recipient
            .parse()
            .map_err(|_| TransportError::InvalidAddress(recipient.clone()))?;
        builder = builder.to(mailbox);
    }

    builder
        .body(email.body.clone())
        .map_err(|e| TransportError::Build(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<(), TransportError> {
        if email.recipients.is_empty() {
            debug!(subject = %email.subject, "smtp: no recipients, nothing to send");
            return Ok(());
        }

        let message = build_message(&email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| TransportError::Smtp(e.to_string()))?;

        debug!(recipients = email.recipients.len(), "smtp: message accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(recipients: &[&str]) -> OutgoingEmail {
        OutgoingEmail {
            subject: "Spring sale".to_string(),
            body: "Everything is 20% off".to_string(),
            sender: "news@example.com".to_string(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn local_transport() -> SmtpMailTransport {
        SmtpMailTransport::new(SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            username: None,
            password: None,
            tls: SmtpTls::None,
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn tls_setting_defaults_to_starttls() {
        assert_eq!(SmtpTls::from_setting("TLS"), SmtpTls::Tls);
        assert_eq!(SmtpTls::from_setting("none"), SmtpTls::None);
        assert_eq!(SmtpTls::from_setting("whatever"), SmtpTls::StartTls);
    }

    #[test]
    fn message_addresses_every_recipient() {
        let message = build_message(&email(&["a@example.com", "b@example.com"])).unwrap();

        let to = message.envelope().to();
        assert_eq!(to.len(), 2);
        assert_eq!(to[0].to_string(), "a@example.com");
        assert_eq!(to[1].to_string(), "b@example.com");
        assert_eq!(message.envelope().from().unwrap().to_string(), "news@example.com");
    }

    #[test]
    fn invalid_recipient_is_reported() {
        let err = build_message(&email(&["a@example.com", "not-an-address"])).unwrap_err();

        assert_eq!(err, TransportError::InvalidAddress("not-an-address".to_string()));
    }

    #[test]
    fn invalid_sender_is_reported() {
        let mut email = email(&["a@example.com"]);
        email.sender = "nobody".to_string();

        let err = build_message(&email).unwrap_err();

        assert_eq!(err, TransportError::InvalidAddress("nobody".to_string()));
    }

    #[tokio::test]
    async fn empty_recipient_list_sends_nothing() {
        let transport = local_transport();

        assert!(transport.send(email(&[])).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_address_fails_before_connecting() {
        let transport = local_transport();

        let err = transport.send(email(&["broken"])).await.unwrap_err();

        assert!(matches!(err, TransportError::InvalidAddress(_)));
    }
}
