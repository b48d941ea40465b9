use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, RunQueryDsl, delete, dsl::count_star, insert_into, prelude::*, update};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{clients, mailing_attempts, mailing_clients, mailings, messages},
};
use domain::{
    entities::{
        mailings::{
            InsertMailingClientEntity, InsertMailingEntity, MailingDispatchStateEntity,
            MailingEntity, UpdateMailingEntity,
        },
        messages::MessageEntity,
    },
    repositories::mailings::MailingRepository,
    value_objects::{
        enums::{attempt_statuses::AttemptStatus, mailing_statuses::MailingStatus},
        mailings::{MailingDispatchModel, MailingModel},
    },
};

pub struct MailingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MailingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    fn recipient_rows(mailing_id: Uuid, client_ids: Vec<Uuid>) -> Vec<InsertMailingClientEntity> {
        let mut client_ids = client_ids;
        client_ids.sort();
        client_ids.dedup();
        client_ids
            .into_iter()
            .map(|client_id| InsertMailingClientEntity {
                mailing_id,
                client_id,
            })
            .collect()
    }
}

#[async_trait]
impl MailingRepository for MailingPostgres {
    async fn find_by_id(&self, mailing_id: Uuid) -> Result<Option<MailingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = mailings::table
            .find(mailing_id)
            .select(MailingEntity::as_select())
            .first::<MailingEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_dispatch_target(
        &self,
        mailing_id: Uuid,
    ) -> Result<Option<MailingDispatchModel>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = mailings::table
            .inner_join(messages::table)
            .filter(mailings::id.eq(mailing_id))
            .select((MailingEntity::as_select(), MessageEntity::as_select()))
            .first::<(MailingEntity, MessageEntity)>(&mut conn)
            .optional()?;

        let Some((mailing, message)) = row else {
            return Ok(None);
        };

        let recipients = mailing_clients::table
            .inner_join(clients::table)
            .filter(mailing_clients::mailing_id.eq(mailing_id))
            .select(clients::email)
            .load::<String>(&mut conn)?;

        Ok(Some(MailingDispatchModel {
            mailing: MailingModel::try_from(mailing)?,
            message,
            recipients,
        }))
    }

    async fn list(&self, owner_id: Option<Uuid>) -> Result<Vec<MailingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = mailings::table
            .select(MailingEntity::as_select())
            .into_boxed();

        if let Some(owner_id) = owner_id {
            query = query.filter(mailings::owner_id.eq(owner_id));
        }

        let results = query
            .order((
                mailings::scheduled_at.asc().nulls_first(),
                mailings::created_at.asc(),
            ))
            .load::<MailingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_client_ids(&self, mailing_id: Uuid) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = mailing_clients::table
            .filter(mailing_clients::mailing_id.eq(mailing_id))
            .select(mailing_clients::client_id)
            .load::<Uuid>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_message_id(&self, message_id: Uuid) -> Result<Option<MailingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = mailings::table
            .filter(mailings::message_id.eq(message_id))
            .select(MailingEntity::as_select())
            .first::<MailingEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn create(
        &self,
        insert_mailing_entity: InsertMailingEntity,
        client_ids: Vec<Uuid>,
    ) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<Uuid, diesel::result::Error, _>(|tx| {
            let mailing_id = insert_into(mailings::table)
                .values(&insert_mailing_entity)
                .returning(mailings::id)
                .get_result::<Uuid>(tx)?;

            insert_into(mailing_clients::table)
                .values(&Self::recipient_rows(mailing_id, client_ids))
                .execute(tx)?;

            Ok(mailing_id)
        })?;

        Ok(result)
    }

    async fn update(
        &self,
        mailing_id: Uuid,
        update_mailing_entity: UpdateMailingEntity,
        client_ids: Vec<Uuid>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<(), diesel::result::Error, _>(|tx| {
            update(mailings::table.find(mailing_id))
                .set(&update_mailing_entity)
                .execute(tx)?;

            delete(mailing_clients::table.filter(mailing_clients::mailing_id.eq(mailing_id)))
                .execute(tx)?;

            insert_into(mailing_clients::table)
                .values(&Self::recipient_rows(mailing_id, client_ids))
                .execute(tx)?;

            Ok(())
        })?;

        Ok(())
    }

    async fn delete(&self, mailing_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Attempts and recipient links cascade in the database.
        delete(mailings::table.find(mailing_id)).execute(&mut conn)?;

        Ok(())
    }

    async fn save_dispatch_state(
        &self,
        mailing_id: Uuid,
        dispatch_state: MailingDispatchStateEntity,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(mailings::table.find(mailing_id))
            .set(&dispatch_state)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn set_blocked(&self, mailing_id: Uuid, is_blocked: bool) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(mailings::table.find(mailing_id))
            .set((
                mailings::is_blocked.eq(is_blocked),
                mailings::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn try_claim_dispatch(
        &self,
        mailing_id: Uuid,
        now: DateTime<Utc>,
        claimed_until: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Single conditional update: whoever changes the row owns the dispatch.
        let claimed = update(
            mailings::table
                .filter(mailings::id.eq(mailing_id))
                .filter(mailings::status.ne(MailingStatus::Completed.to_string()))
                .filter(
                    mailings::dispatch_claimed_until
                        .is_null()
                        .or(mailings::dispatch_claimed_until.lt(now)),
                ),
        )
        .set(mailings::dispatch_claimed_until.eq(Some(claimed_until)))
        .execute(&mut conn)?;

        Ok(claimed == 1)
    }

    async fn release_dispatch_claim(&self, mailing_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(mailings::table.find(mailing_id))
            .set(mailings::dispatch_claimed_until.eq(None::<DateTime<Utc>>))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn list_dispatch_candidates(
        &self,
        now: DateTime<Utc>,
        max_failed_attempts: i64,
        limit: i64,
    ) -> Result<Vec<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let statuses = vec![
            MailingStatus::Created.to_string(),
            MailingStatus::Running.to_string(),
        ];

        let candidate_ids = mailings::table
            .filter(mailings::is_blocked.eq(false))
            .filter(mailings::status.eq_any(statuses))
            .filter(
                mailings::dispatch_claimed_until
                    .is_null()
                    .or(mailings::dispatch_claimed_until.lt(now)),
            )
            .filter(
                mailings::scheduled_at
                    .is_null()
                    .or(mailings::scheduled_at.le(now)),
            )
            .order(mailings::created_at.asc())
            .select(mailings::id)
            .load::<Uuid>(&mut conn)?;

        if candidate_ids.is_empty() {
            return Ok(candidate_ids);
        }

        let failed_counts: HashMap<Uuid, i64> = mailing_attempts::table
            .filter(mailing_attempts::mailing_id.eq_any(&candidate_ids))
            .filter(mailing_attempts::status.eq(AttemptStatus::NotSuccessful.to_string()))
            .group_by(mailing_attempts::mailing_id)
            .select((mailing_attempts::mailing_id, count_star()))
            .load::<(Uuid, i64)>(&mut conn)?
            .into_iter()
            .collect();

        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);

        Ok(candidate_ids
            .into_iter()
            .filter(|id| failed_counts.get(id).copied().unwrap_or(0) < max_failed_attempts)
            .take(limit)
            .collect())
    }
}
