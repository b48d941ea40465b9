use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::mailing_attempts::{
    InsertMailingAttemptEntity, MailingAttemptEntity,
};

/// Attempts are append-only: there is no update or delete.
#[automock]
#[async_trait]
pub trait MailingAttemptRepository {
    async fn create(
        &self,
        insert_attempt_entity: InsertMailingAttemptEntity,
    ) -> Result<MailingAttemptEntity>;

    async fn list_by_mailing(&self, mailing_id: Uuid) -> Result<Vec<MailingAttemptEntity>>;
}
