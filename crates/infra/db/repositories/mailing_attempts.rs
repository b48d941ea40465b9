use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::mailing_attempts};
use domain::{
    entities::mailing_attempts::{InsertMailingAttemptEntity, MailingAttemptEntity},
    repositories::mailing_attempts::MailingAttemptRepository,
};

pub struct MailingAttemptPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MailingAttemptPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MailingAttemptRepository for MailingAttemptPostgres {
    async fn create(
        &self,
        insert_attempt_entity: InsertMailingAttemptEntity,
    ) -> Result<MailingAttemptEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(mailing_attempts::table)
            .values(&insert_attempt_entity)
            .returning(MailingAttemptEntity::as_returning())
            .get_result::<MailingAttemptEntity>(&mut conn)?;

        Ok(result)
    }

    async fn list_by_mailing(&self, mailing_id: Uuid) -> Result<Vec<MailingAttemptEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = mailing_attempts::table
            .filter(mailing_attempts::mailing_id.eq(mailing_id))
            .order((mailing_attempts::attempted_at.asc(), mailing_attempts::id.asc()))
            .select(MailingAttemptEntity::as_select())
            .load::<MailingAttemptEntity>(&mut conn)?;

        Ok(results)
    }
}
