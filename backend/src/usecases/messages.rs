use crates::domain::{
    entities::messages::MessageEntity,
    repositories::messages::MessageRepository,
    value_objects::{
        iam::{AccessPolicy, Actor},
        messages::{InsertMessageModel, MessageModel, UpdateMessageModel},
    },
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::crud_error::{CrudError, UseCaseResult};

pub struct MessageUseCase<M>
where
    M: MessageRepository + Send + Sync + 'static,
{
    message_repo: Arc<M>,
    policy: Arc<dyn AccessPolicy>,
}

impl<M> MessageUseCase<M>
where
    M: MessageRepository + Send + Sync + 'static,
{
    pub fn new(message_repo: Arc<M>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            message_repo,
            policy,
        }
    }

    pub async fn list(&self, actor: Actor) -> UseCaseResult<Vec<MessageModel>> {
        let owner_filter = (!actor.sees_all()).then_some(actor.user_id);

        let messages = self.message_repo.list(owner_filter).await.map_err(|err| {
            error!(
                user_id = %actor.user_id,
                db_error = ?err,
                "messages: failed to list messages"
            );
            err
        })?;

        Ok(messages.into_iter().map(MessageModel::from).collect())
    }

    pub async fn get(&self, actor: Actor, message_id: Uuid) -> UseCaseResult<MessageModel> {
        let message = self.load(message_id).await?;

        if !self.policy.can_view(&actor, &message) {
            return Err(CrudError::Forbidden);
        }

        Ok(MessageModel::from(message))
    }

    pub async fn create(
        &self,
        actor: Actor,
        insert_message_model: InsertMessageModel,
    ) -> UseCaseResult<Uuid> {
        insert_message_model
            .validate()
            .map_err(CrudError::BadRequest)?;

        let message_id = self
            .message_repo
            .create(insert_message_model.to_entity(actor.user_id))
            .await
            .map_err(|err| {
                error!(
                    user_id = %actor.user_id,
                    db_error = ?err,
                    "messages: failed to create message"
                );
                err
            })?;

        info!(user_id = %actor.user_id, %message_id, "messages: message created");
        Ok(message_id)
    }

    pub async fn update(
        &self,
        actor: Actor,
        message_id: Uuid,
        update_message_model: UpdateMessageModel,
    ) -> UseCaseResult<()> {
        update_message_model
            .validate()
            .map_err(CrudError::BadRequest)?;

        let message = self.load(message_id).await?;
        if !self.policy.can_mutate(&actor, &message) {
            warn!(user_id = %actor.user_id, %message_id, "messages: update forbidden");
            return Err(CrudError::Forbidden);
        }

        self.message_repo
            .update(message_id, update_message_model.to_entity())
            .await
            .map_err(|err| {
                error!(%message_id, db_error = ?err, "messages: failed to update message");
                err
            })?;

        Ok(())
    }

    /// Deleting a message also removes the mailing bound to it.
    pub async fn delete(&self, actor: Actor, message_id: Uuid) -> UseCaseResult<()> {
        let message = self.load(message_id).await?;
        if !self.policy.can_mutate(&actor, &message) {
            warn!(user_id = %actor.user_id, %message_id, "messages: delete forbidden");
            return Err(CrudError::Forbidden);
        }

        self.message_repo.delete(message_id).await.map_err(|err| {
            error!(%message_id, db_error = ?err, "messages: failed to delete message");
            err
        })?;

        info!(user_id = %actor.user_id, %message_id, "messages: message deleted");
        Ok(())
    }

    async fn load(&self, message_id: Uuid) -> UseCaseResult<MessageEntity> {
        self.message_repo
            .find_by_id(message_id)
            .await
            .map_err(|err| {
                error!(%message_id, db_error = ?err, "messages: failed to load message");
                CrudError::Internal(err)
            })?
            .ok_or(CrudError::NotFound("message"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        repositories::messages::MockMessageRepository,
        value_objects::{enums::roles::Role, iam::OwnerPolicy},
    };
    use mockall::predicate::eq;

    fn message(id: Uuid, owner_id: Uuid) -> MessageEntity {
        let now = Utc::now();
        MessageEntity {
            id,
            subject: "Spring sale".to_string(),
            body: "Everything is 20% off".to_string(),
            owner_id: Some(owner_id),
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(repo: MockMessageRepository) -> MessageUseCase<MockMessageRepository> {
        MessageUseCase::new(Arc::new(repo), Arc::new(OwnerPolicy))
    }

    #[tokio::test]
    async fn create_rejects_blank_subject() {
        let mut repo = MockMessageRepository::new();
        repo.expect_create().times(0);

        let err = usecase(repo)
            .create(
                Actor::new(Uuid::new_v4(), Role::User),
                InsertMessageModel {
                    subject: "   ".to_string(),
                    body: "text".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CrudError::BadRequest(_)));
    }

    #[tokio::test]
    async fn owner_can_update_message() {
        let user_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let stored = message(message_id, user_id);
        let mut repo = MockMessageRepository::new();
        repo.expect_find_by_id()
            .with(eq(message_id))
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_update()
            .withf(move |id, entity| {
                *id == message_id && entity.subject.as_deref() == Some("Summer sale")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        usecase(repo)
            .update(
                Actor::new(user_id, Role::User),
                message_id,
                UpdateMessageModel {
                    subject: Some(" Summer sale ".to_string()),
                    body: None,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn other_user_cannot_delete_message() {
        let message_id = Uuid::new_v4();
        let stored = message(message_id, Uuid::new_v4());
        let mut repo = MockMessageRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_delete().times(0);

        let err = usecase(repo)
            .delete(Actor::new(Uuid::new_v4(), Role::User), message_id)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn manager_can_view_foreign_message() {
        let message_id = Uuid::new_v4();
        let stored = message(message_id, Uuid::new_v4());
        let mut repo = MockMessageRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));

        let model = usecase(repo)
            .get(Actor::new(Uuid::new_v4(), Role::Manager), message_id)
            .await
            .unwrap();

        assert_eq!(model.subject, "Spring sale");
    }
}
