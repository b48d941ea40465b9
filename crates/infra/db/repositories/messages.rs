use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::messages};
use domain::{
    entities::messages::{MessageEntity, InsertMessageEntity, UpdateMessageEntity},
    repositories::messages::MessageRepository,
};

pub struct MessagePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MessagePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MessageRepository for MessagePostgres {
    async fn find_by_id(&self, message_id: Uuid) -> Result<Option<MessageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = messages::table
            .find(message_id)
            .select(MessageEntity::as_select())
            .first::<MessageEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list(&self, owner_id: Option<Uuid>) -> Result<Vec<MessageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = messages::table
            .select(MessageEntity::as_select())
            .into_boxed();

        if let Some(owner_id) = owner_id {
            query = query.filter(messages::owner_id.eq(owner_id));
        }

        let results = query
            .order(messages::subject.asc())
            .load::<MessageEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create(&self, insert_message_entity: InsertMessageEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(messages::table)
            .values(&insert_message_entity)
            .returning(messages::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn update(
        &self,
        message_id: Uuid,
        update_message_entity: UpdateMessageEntity,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(messages::table.find(message_id))
            .set(&update_message_entity)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn delete(&self, message_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(messages::table.find(message_id)).execute(&mut conn)?;

        Ok(())
    }
}
