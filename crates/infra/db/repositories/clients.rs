use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::clients};
use domain::{
    entities::clients::{ClientEntity, InsertClientEntity, UpdateClientEntity},
    repositories::clients::ClientRepository,
};

pub struct ClientPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ClientPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ClientRepository for ClientPostgres {
    async fn find_by_id(&self, client_id: Uuid) -> Result<Option<ClientEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = clients::table
            .find(client_id)
            .select(ClientEntity::as_select())
            .first::<ClientEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_email(&self, email: String) -> Result<Option<ClientEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = clients::table
            .filter(clients::email.eq(email))
            .select(ClientEntity::as_select())
            .first::<ClientEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_ids(&self, client_ids: Vec<Uuid>) -> Result<Vec<ClientEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = clients::table
            .filter(clients::id.eq_any(client_ids))
            .select(ClientEntity::as_select())
            .load::<ClientEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list(&self, owner_id: Option<Uuid>) -> Result<Vec<ClientEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = clients::table
            .select(ClientEntity::as_select())
            .into_boxed();

        if let Some(owner_id) = owner_id {
            query = query.filter(clients::owner_id.eq(owner_id));
        }

        let results = query
            .order(clients::full_name.asc())
            .load::<ClientEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create(&self, insert_client_entity: InsertClientEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(clients::table)
            .values(&insert_client_entity)
            .returning(clients::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn update(
        &self,
        client_id: Uuid,
        update_client_entity: UpdateClientEntity,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(clients::table.find(client_id))
            .set(&update_client_entity)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn delete(&self, client_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(clients::table.find(client_id)).execute(&mut conn)?;

        Ok(())
    }
}
