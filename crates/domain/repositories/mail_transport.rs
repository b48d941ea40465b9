use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::mail::{OutgoingEmail, TransportError};

/// Sends one email to every recipient of a mailing.
#[automock]
#[async_trait]
pub trait MailTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<(), TransportError>;
}
