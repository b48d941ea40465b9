use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::messages::{InsertMessageEntity, MessageEntity, UpdateMessageEntity};

#[automock]
#[async_trait]
pub trait MessageRepository {
    async fn find_by_id(&self, message_id: Uuid) -> Result<Option<MessageEntity>>;
    async fn list(&self, owner_id: Option<Uuid>) -> Result<Vec<MessageEntity>>;
    async fn create(&self, insert_message_entity: InsertMessageEntity) -> Result<Uuid>;
    async fn update(
        &self,
        message_id: Uuid,
        update_message_entity: UpdateMessageEntity,
    ) -> Result<()>;
    async fn delete(&self, message_id: Uuid) -> Result<()>;
}
