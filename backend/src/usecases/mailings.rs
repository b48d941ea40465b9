use crates::{
    application::usecases::mailing_dispatch::{
        DispatchError, DispatchReport, MailingDispatchUseCase,
    },
    domain::{
        entities::{mailings::MailingEntity, messages::MessageEntity},
        repositories::{
            clients::ClientRepository, mail_transport::MailTransport,
            mailing_attempts::MailingAttemptRepository, mailings::MailingRepository,
            messages::MessageRepository,
        },
        value_objects::{
            iam::{AccessPolicy, Actor},
            mailings::{
                InsertMailingModel, MailingAttemptModel, MailingDetailModel, MailingModel,
                UpdateMailingModel,
            },
        },
    },
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::crud_error::{CrudError, UseCaseResult};
use crate::detail_cache::DetailCache;
use crates::domain::entities::mailings::UpdateMailingEntity;

pub struct MailingUseCase<M, Msg, C, A, T>
where
    M: MailingRepository + Send + Sync + 'static,
    Msg: MessageRepository + Send + Sync + 'static,
    C: ClientRepository + Send + Sync + 'static,
    A: MailingAttemptRepository + Send + Sync + 'static,
    T: MailTransport + Send + Sync + 'static,
{
    mailing_repo: Arc<M>,
    message_repo: Arc<Msg>,
    client_repo: Arc<C>,
    attempt_repo: Arc<A>,
    dispatcher: Arc<MailingDispatchUseCase<M, A, T>>,
    policy: Arc<dyn AccessPolicy>,
    detail_cache: DetailCache<MailingDetailModel>,
}

impl<M, Msg, C, A, T> MailingUseCase<M, Msg, C, A, T>
where
    M: MailingRepository + Send + Sync + 'static,
    Msg: MessageRepository + Send + Sync + 'static,
    C: ClientRepository + Send + Sync + 'static,
    A: MailingAttemptRepository + Send + Sync + 'static,
    T: MailTransport + Send + Sync + 'static,
{
    pub fn new(
        mailing_repo: Arc<M>,
        message_repo: Arc<Msg>,
        client_repo: Arc<C>,
        attempt_repo: Arc<A>,
        dispatcher: Arc<MailingDispatchUseCase<M, A, T>>,
        policy: Arc<dyn AccessPolicy>,
        detail_cache: DetailCache<MailingDetailModel>,
    ) -> Self {
        Self {
            mailing_repo,
            message_repo,
            client_repo,
            attempt_repo,
            dispatcher,
            policy,
            detail_cache,
        }
    }

    pub async fn list(&self, actor: Actor) -> UseCaseResult<Vec<MailingModel>> {
        let owner_filter = (!actor.sees_all()).then_some(actor.user_id);

        let mailings = self.mailing_repo.list(owner_filter).await.map_err(|err| {
            error!(
                user_id = %actor.user_id,
                db_error = ?err,
                "mailings: failed to list mailings"
            );
            err
        })?;

        let models = mailings
            .into_iter()
            .map(MailingModel::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(models)
    }

    pub async fn get(&self, actor: Actor, mailing_id: Uuid) -> UseCaseResult<MailingDetailModel> {
        if let Some(detail) = self.detail_cache.get(mailing_id) {
            if !self.policy.can_view(&actor, &detail.mailing) {
                return Err(CrudError::Forbidden);
            }
            return Ok(detail);
        }

        let mailing = self.load(mailing_id).await?;
        if !self.policy.can_view(&actor, &mailing) {
            return Err(CrudError::Forbidden);
        }

        let client_ids = self
            .mailing_repo
            .list_client_ids(mailing_id)
            .await
            .map_err(|err| {
                error!(%mailing_id, db_error = ?err, "mailings: failed to load recipients");
                err
            })?;

        let detail = MailingDetailModel {
            mailing: MailingModel::try_from(mailing)?,
            client_ids,
        };
        self.detail_cache.insert(mailing_id, detail.clone());

        Ok(detail)
    }

    pub async fn create(
        &self,
        actor: Actor,
        insert_mailing_model: InsertMailingModel,
    ) -> UseCaseResult<Uuid> {
        self.ensure_message_available(&actor, insert_mailing_model.message_id, None)
            .await?;
        let client_ids = self
            .ensure_recipients(&actor, &insert_mailing_model.client_ids)
            .await?;

        let message_id = insert_mailing_model.message_id;
        let mailing_id = self
            .mailing_repo
            .create(insert_mailing_model.to_entity(actor.user_id), client_ids)
            .await
            .map_err(|err| {
                error!(
                    user_id = %actor.user_id,
                    db_error = ?err,
                    "mailings: failed to create mailing"
                );
                CrudError::from_write(err, || message_taken(message_id))
            })?;

        info!(user_id = %actor.user_id, %mailing_id, "mailings: mailing created");
        Ok(mailing_id)
    }

    /// Replaces the message and the recipient set. Lifecycle fields are never touched here.
    pub async fn update(
        &self,
        actor: Actor,
        mailing_id: Uuid,
        update_mailing_model: UpdateMailingModel,
    ) -> UseCaseResult<()> {
        let mailing = self.load(mailing_id).await?;
        if !self.policy.can_mutate(&actor, &mailing) {
            warn!(user_id = %actor.user_id, %mailing_id, "mailings: update forbidden");
            return Err(CrudError::Forbidden);
        }

        if update_mailing_model.message_id != mailing.message_id {
            self.ensure_message_available(&actor, update_mailing_model.message_id, Some(mailing_id))
                .await?;
        }
        let client_ids = self
            .ensure_recipients(&actor, &update_mailing_model.client_ids)
            .await?;

        let message_id = update_mailing_model.message_id;
        let update_mailing_entity = UpdateMailingEntity {
            message_id: Some(update_mailing_model.message_id),
            updated_at: Utc::now(),
        };

        let result = self
            .mailing_repo
            .update(mailing_id, update_mailing_entity, client_ids)
            .await;
        self.detail_cache.invalidate(mailing_id);

        result.map_err(|err| {
            error!(%mailing_id, db_error = ?err, "mailings: failed to update mailing");
            CrudError::from_write(err, || message_taken(message_id))
        })
    }

    pub async fn delete(&self, actor: Actor, mailing_id: Uuid) -> UseCaseResult<()> {
        let mailing = self.load(mailing_id).await?;
        if !self.policy.can_mutate(&actor, &mailing) {
            warn!(user_id = %actor.user_id, %mailing_id, "mailings: delete forbidden");
            return Err(CrudError::Forbidden);
        }

        let result = self.mailing_repo.delete(mailing_id).await;
        self.detail_cache.invalidate(mailing_id);

        result.map_err(|err| {
            error!(%mailing_id, db_error = ?err, "mailings: failed to delete mailing");
            CrudError::Internal(err)
        })?;

        info!(user_id = %actor.user_id, %mailing_id, "mailings: mailing deleted");
        Ok(())
    }

    /// Manual trigger. The permission check happens here; the dispatcher never sees the actor.
    pub async fn dispatch(&self, actor: Actor, mailing_id: Uuid) -> UseCaseResult<DispatchReport> {
        let mailing = self.load(mailing_id).await?;
        if !self.policy.can_mutate(&actor, &mailing) {
            warn!(user_id = %actor.user_id, %mailing_id, "mailings: dispatch forbidden");
            return Err(CrudError::Forbidden);
        }

        let result = self.dispatcher.dispatch_by_id(mailing_id).await;
        self.detail_cache.invalidate(mailing_id);

        match result {
            Ok(report) => {
                info!(
                    user_id = %actor.user_id,
                    %mailing_id,
                    outcome = %report.outcome,
                    "mailings: manual dispatch finished"
                );
                Ok(report)
            }
            Err(DispatchError::NotFound(_)) => Err(CrudError::NotFound("mailing")),
            Err(err @ (DispatchError::AlreadyCompleted(_) | DispatchError::InProgress(_))) => {
                Err(CrudError::Conflict(err.to_string()))
            }
            Err(DispatchError::Internal(err)) => Err(CrudError::Internal(err)),
        }
    }

    pub async fn set_blocked(
        &self,
        actor: Actor,
        mailing_id: Uuid,
        is_blocked: bool,
    ) -> UseCaseResult<()> {
        let mailing = self.load(mailing_id).await?;
        if !self.policy.can_block(&actor, &mailing) {
            warn!(user_id = %actor.user_id, %mailing_id, "mailings: block toggle forbidden");
            return Err(CrudError::Forbidden);
        }

        let result = self.mailing_repo.set_blocked(mailing_id, is_blocked).await;
        self.detail_cache.invalidate(mailing_id);

        result.map_err(|err| {
            error!(%mailing_id, db_error = ?err, "mailings: failed to toggle block");
            CrudError::Internal(err)
        })?;

        info!(
            user_id = %actor.user_id,
            %mailing_id,
            is_blocked,
            "mailings: block flag updated"
        );
        Ok(())
    }

    pub async fn attempts(
        &self,
        actor: Actor,
        mailing_id: Uuid,
    ) -> UseCaseResult<Vec<MailingAttemptModel>> {
        let mailing = self.load(mailing_id).await?;
        if !self.policy.can_view(&actor, &mailing) {
            return Err(CrudError::Forbidden);
        }

        let attempts = self
            .attempt_repo
            .list_by_mailing(mailing_id)
            .await
            .map_err(|err| {
                error!(%mailing_id, db_error = ?err, "mailings: failed to list attempts");
                err
            })?;

        let models = attempts
            .into_iter()
            .map(MailingAttemptModel::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(models)
    }

    async fn load(&self, mailing_id: Uuid) -> UseCaseResult<MailingEntity> {
        self.mailing_repo
            .find_by_id(mailing_id)
            .await
            .map_err(|err| {
                error!(%mailing_id, db_error = ?err, "mailings: failed to load mailing");
                CrudError::Internal(err)
            })?
            .ok_or(CrudError::NotFound("mailing"))
    }

    /// The message must exist, belong to the actor and not already back another mailing.
    async fn ensure_message_available(
        &self,
        actor: &Actor,
        message_id: Uuid,
        current: Option<Uuid>,
    ) -> UseCaseResult<MessageEntity> {
        let message = self
            .message_repo
            .find_by_id(message_id)
            .await
            .map_err(CrudError::Internal)?
            .ok_or_else(|| CrudError::BadRequest(format!("message {message_id} does not exist")))?;

        if !self.policy.can_mutate(actor, &message) {
            return Err(CrudError::Forbidden);
        }

        let bound = self
            .mailing_repo
            .find_by_message_id(message_id)
            .await
            .map_err(CrudError::Internal)?;

        match bound {
            Some(other) if Some(other.id) != current => Err(CrudError::Conflict(format!(
                "message {message_id} is already used by mailing {}",
                other.id
            ))),
            _ => Ok(message),
        }
    }

    async fn ensure_recipients(&self, actor: &Actor, client_ids: &[Uuid]) -> UseCaseResult<Vec<Uuid>> {
        let mut client_ids = client_ids.to_vec();
        client_ids.sort();
        client_ids.dedup();

        if client_ids.is_empty() {
            return Ok(client_ids);
        }

        let clients = self
            .client_repo
            .find_by_ids(client_ids.clone())
            .await
            .map_err(CrudError::Internal)?;

        if clients.len() != client_ids.len() {
            return Err(CrudError::BadRequest(
                "one or more clients do not exist".to_string(),
            ));
        }

        if clients
            .iter()
            .any(|client| !self.policy.can_view(actor, client))
        {
            return Err(CrudError::Forbidden);
        }

        Ok(client_ids)
    }
}

fn message_taken(message_id: Uuid) -> String {
    format!("message {message_id} is already used by another mailing")
}
