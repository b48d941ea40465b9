use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::clients::{ClientEntity, InsertClientEntity, UpdateClientEntity};

#[automock]
#[async_trait]
pub trait ClientRepository {
    async fn find_by_id(&self, client_id: Uuid) -> Result<Option<ClientEntity>>;
    async fn find_by_email(&self, email: String) -> Result<Option<ClientEntity>>;
    async fn find_by_ids(&self, client_ids: Vec<Uuid>) -> Result<Vec<ClientEntity>>;
    async fn list(&self, owner_id: Option<Uuid>) -> Result<Vec<ClientEntity>>;
    async fn create(&self, insert_client_entity: InsertClientEntity) -> Result<Uuid>;
    async fn update(
        &self,
        client_id: Uuid,
        update_client_entity: UpdateClientEntity,
    ) -> Result<()>;
    async fn delete(&self, client_id: Uuid) -> Result<()>;
}
