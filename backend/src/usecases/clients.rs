use crates::domain::{
    entities::clients::ClientEntity,
    repositories::clients::ClientRepository,
    value_objects::{
        clients::{ClientModel, InsertClientModel, UpdateClientModel},
        iam::{AccessPolicy, Actor},
    },
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::crud_error::{CrudError, UseCaseResult};

pub struct ClientUseCase<C>
where
    C: ClientRepository + Send + Sync + 'static,
{
    client_repo: Arc<C>,
    policy: Arc<dyn AccessPolicy>,
}

impl<C> ClientUseCase<C>
where
    C: ClientRepository + Send + Sync + 'static,
{
    pub fn new(client_repo: Arc<C>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            client_repo,
            policy,
        }
    }

    pub async fn list(&self, actor: Actor) -> UseCaseResult<Vec<ClientModel>> {
        let owner_filter = (!actor.sees_all()).then_some(actor.user_id);

        let clients = self.client_repo.list(owner_filter).await.map_err(|err| {
            error!(
                user_id = %actor.user_id,
                db_error = ?err,
                "clients: failed to list clients"
            );
            err
        })?;

        Ok(clients.into_iter().map(ClientModel::from).collect())
    }

    pub async fn get(&self, actor: Actor, client_id: Uuid) -> UseCaseResult<ClientModel> {
        let client = self.load(client_id).await?;

        if !self.policy.can_view(&actor, &client) {
            return Err(CrudError::Forbidden);
        }

        Ok(ClientModel::from(client))
    }

    pub async fn create(
        &self,
        actor: Actor,
        insert_client_model: InsertClientModel,
    ) -> UseCaseResult<Uuid> {
        insert_client_model
            .validate()
            .map_err(CrudError::BadRequest)?;

        let insert_client_entity = insert_client_model.to_entity(actor.user_id);
        self.ensure_email_free(&insert_client_entity.email, None)
            .await?;

        let client_id = self
            .client_repo
            .create(insert_client_entity)
            .await
            .map_err(|err| {
                error!(
                    user_id = %actor.user_id,
                    db_error = ?err,
                    "clients: failed to create client"
                );
                err
            })?;

        info!(user_id = %actor.user_id, %client_id, "clients: client created");
        Ok(client_id)
    }

    pub async fn update(
        &self,
        actor: Actor,
        client_id: Uuid,
        update_client_model: UpdateClientModel,
    ) -> UseCaseResult<()> {
        update_client_model
            .validate()
            .map_err(CrudError::BadRequest)?;

        let client = self.load(client_id).await?;
        if !self.policy.can_mutate(&actor, &client) {
            warn!(user_id = %actor.user_id, %client_id, "clients: update forbidden");
            return Err(CrudError::Forbidden);
        }

        let update_client_entity = update_client_model.to_entity();
        if let Some(email) = update_client_entity.email.as_deref() {
            self.ensure_email_free(email, Some(client_id)).await?;
        }

        self.client_repo
            .update(client_id, update_client_entity)
            .await
            .map_err(|err| {
                error!(%client_id, db_error = ?err, "clients: failed to update client");
                err
            })?;

        Ok(())
    }

    pub async fn delete(&self, actor: Actor, client_id: Uuid) -> UseCaseResult<()> {
        let client = self.load(client_id).await?;
        if !self.policy.can_mutate(&actor, &client) {
            warn!(user_id = %actor.user_id, %client_id, "clients: delete forbidden");
            return Err(CrudError::Forbidden);
        }

        self.client_repo.delete(client_id).await.map_err(|err| {
            error!(%client_id, db_error = ?err, "clients: failed to delete client");
            err
        })?;

        info!(user_id = %actor.user_id, %client_id, "clients: client deleted");
        Ok(())
    }

    async fn load(&self, client_id: Uuid) -> UseCaseResult<ClientEntity> {
        self.client_repo
            .find_by_id(client_id)
            .await
            .map_err(|err| {
                error!(%client_id, db_error = ?err, "clients: failed to load client");
                CrudError::Internal(err)
            })?
            .ok_or(CrudError::NotFound("client"))
    }

    async fn ensure_email_free(&self, email: &str, current: Option<Uuid>) -> UseCaseResult<()> {
        let existing = self
            .client_repo
            .find_by_email(email.to_string())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "clients: failed to look up client email");
                CrudError::Internal(err)
            })?;

        match existing {
            Some(existing) if Some(existing.id) != current => Err(CrudError::Conflict(format!(
                "client with email {email} already exists"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        repositories::clients::MockClientRepository,
        value_objects::{enums::roles::Role, iam::OwnerPolicy},
    };
    use mockall::predicate::eq;

    fn client(id: Uuid, owner_id: Uuid, email: &str) -> ClientEntity {
        let now = Utc::now();
        ClientEntity {
            id,
            email: email.to_string(),
            full_name: "Ada Lovelace".to_string(),
            comment: None,
            owner_id: Some(owner_id),
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(repo: MockClientRepository) -> ClientUseCase<MockClientRepository> {
        ClientUseCase::new(Arc::new(repo), Arc::new(OwnerPolicy))
    }

    #[tokio::test]
    async fn list_filters_by_owner_for_plain_users() {
        let user_id = Uuid::new_v4();
        let mut repo = MockClientRepository::new();
        repo.expect_list()
            .with(eq(Some(user_id)))
            .times(1)
            .returning(|_| Ok(vec![]));

        let clients = usecase(repo)
            .list(Actor::new(user_id, Role::User))
            .await
            .unwrap();

        assert!(clients.is_empty());
    }

    #[tokio::test]
    async fn list_is_unfiltered_for_managers() {
        let owner_id = Uuid::new_v4();
        let stored = client(Uuid::new_v4(), owner_id, "a@example.com");
        let mut repo = MockClientRepository::new();
        repo.expect_list()
            .with(eq(None::<Uuid>))
            .times(1)
            .returning(move |_| Ok(vec![stored.clone()]));

        let clients = usecase(repo)
            .list(Actor::new(Uuid::new_v4(), Role::Manager))
            .await
            .unwrap();

        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].owner_id, Some(owner_id));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let mut repo = MockClientRepository::new();
        let existing = client(Uuid::new_v4(), Uuid::new_v4(), "a@example.com");
        repo.expect_find_by_email()
            .with(eq("a@example.com".to_string()))
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_create().times(0);

        let err = usecase(repo)
            .create(
                Actor::new(Uuid::new_v4(), Role::User),
                InsertClientModel {
                    email: " A@Example.com ".to_string(),
                    full_name: "Ada".to_string(),
                    comment: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CrudError::Conflict(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_stores_client_owned_by_actor() {
        let user_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();
        let mut repo = MockClientRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_create()
            .withf(move |entity| {
                entity.owner_id == Some(user_id) && entity.email == "a@example.com"
            })
            .times(1)
            .returning(move |_| Ok(client_id));

        let created = usecase(repo)
            .create(
                Actor::new(user_id, Role::User),
                InsertClientModel {
                    email: "a@example.com".to_string(),
                    full_name: "Ada".to_string(),
                    comment: Some("vip".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(created, client_id);
    }

    #[tokio::test]
    async fn create_rejects_invalid_email() {
        let mut repo = MockClientRepository::new();
        repo.expect_create().times(0);

        let err = usecase(repo)
            .create(
                Actor::new(Uuid::new_v4(), Role::User),
                InsertClientModel {
                    email: "nobody".to_string(),
                    full_name: "Ada".to_string(),
                    comment: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CrudError::BadRequest(_)));
    }

    #[tokio::test]
    async fn get_hides_other_owners_clients_from_users() {
        let client_id = Uuid::new_v4();
        let stored = client(client_id, Uuid::new_v4(), "a@example.com");
        let mut repo = MockClientRepository::new();
        repo.expect_find_by_id()
            .with(eq(client_id))
            .returning(move |_| Ok(Some(stored.clone())));

        let err = usecase(repo)
            .get(Actor::new(Uuid::new_v4(), Role::User), client_id)
            .await
            .unwrap_err();

        assert!(matches!(err, CrudError::Forbidden));
    }

    #[tokio::test]
    async fn manager_cannot_delete_foreign_client() {
        let client_id = Uuid::new_v4();
        let stored = client(client_id, Uuid::new_v4(), "a@example.com");
        let mut repo = MockClientRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_delete().times(0);

        let err = usecase(repo)
            .delete(Actor::new(Uuid::new_v4(), Role::Manager), client_id)
            .await
            .unwrap_err();

        assert!(matches!(err, CrudError::Forbidden));
    }

    #[tokio::test]
    async fn update_allows_keeping_own_email() {
        let user_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();
        let stored = client(client_id, user_id, "a@example.com");
        let same = stored.clone();
        let mut repo = MockClientRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(same.clone())));
        repo.expect_update()
            .withf(move |id, _| *id == client_id)
            .times(1)
            .returning(|_, _| Ok(()));

        usecase(repo)
            .update(
                Actor::new(user_id, Role::User),
                client_id,
                UpdateClientModel {
                    email: Some("a@example.com".to_string()),
                    full_name: None,
                    comment: None,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_client_is_not_found() {
        let mut repo = MockClientRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let err = usecase(repo)
            .delete(Actor::new(Uuid::new_v4(), Role::Admin), Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
