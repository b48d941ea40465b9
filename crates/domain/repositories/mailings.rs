use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::mailings::{
        InsertMailingEntity, MailingDispatchStateEntity, MailingEntity, UpdateMailingEntity,
    },
    value_objects::mailings::MailingDispatchModel,
};

#[automock]
#[async_trait]
pub trait MailingRepository {
    async fn find_by_id(&self, mailing_id: Uuid) -> Result<Option<MailingEntity>>;

    /// Loads the mailing together with its message and recipient addresses.
    async fn find_dispatch_target(&self, mailing_id: Uuid)
    -> Result<Option<MailingDispatchModel>>;

    async fn list(&self, owner_id: Option<Uuid>) -> Result<Vec<MailingEntity>>;

    async fn list_client_ids(&self, mailing_id: Uuid) -> Result<Vec<Uuid>>;

    async fn find_by_message_id(&self, message_id: Uuid) -> Result<Option<MailingEntity>>;

    async fn create(
        &self,
        insert_mailing_entity: InsertMailingEntity,
        client_ids: Vec<Uuid>,
    ) -> Result<Uuid>;

    /// Replaces the message reference and the whole recipient set.
    async fn update(
        &self,
        mailing_id: Uuid,
        update_mailing_entity: UpdateMailingEntity,
        client_ids: Vec<Uuid>,
    ) -> Result<()>;

    async fn delete(&self, mailing_id: Uuid) -> Result<()>;

    async fn save_dispatch_state(
        &self,
        mailing_id: Uuid,
        dispatch_state: MailingDispatchStateEntity,
    ) -> Result<()>;

    async fn set_blocked(&self, mailing_id: Uuid, is_blocked: bool) -> Result<()>;

    /// Takes the dispatch lease until `claimed_until`, across every process sharing the
    /// database. `false` when the mailing is missing, completed, or leased by someone else.
    async fn try_claim_dispatch(
        &self,
        mailing_id: Uuid,
        now: DateTime<Utc>,
        claimed_until: DateTime<Utc>,
    ) -> Result<bool>;

    async fn release_dispatch_claim(&self, mailing_id: Uuid) -> Result<()>;

    /// Unblocked mailings in `created`/`running` whose `scheduled_at` has come and that have
    /// fewer than `max_failed_attempts` unsuccessful attempts, oldest first.
    async fn list_dispatch_candidates(
        &self,
        now: DateTime<Utc>,
        max_failed_attempts: i64,
        limit: i64,
    ) -> Result<Vec<Uuid>>;
}
