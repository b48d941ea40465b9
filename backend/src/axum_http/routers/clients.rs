use crate::{
    auth::AuthUser,
    usecases::{clients::ClientUseCase, crud_error::CrudError},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crates::{
    domain::{
        repositories::clients::ClientRepository,
        value_objects::{
            clients::{InsertClientModel, UpdateClientModel},
            iam::AccessPolicy,
        },
    },
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::clients::ClientPostgres},
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub fn routes(db_pool: Arc<PgPoolSquad>, policy: Arc<dyn AccessPolicy>) -> Router {
    let client_repository = ClientPostgres::new(Arc::clone(&db_pool));
    let client_usecase = ClientUseCase::new(Arc::new(client_repository), policy);

    Router::new()
        .route(
            "/",
            get(list::<ClientPostgres>).post(create::<ClientPostgres>),
        )
        .route(
            "/:client_id",
            get(get_one::<ClientPostgres>)
                .put(update::<ClientPostgres>)
                .delete(remove::<ClientPostgres>),
        )
        .with_state(Arc::new(client_usecase))
}

pub async fn list<C>(
    State(usecase): State<Arc<ClientUseCase<C>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, CrudError>
where
    C: ClientRepository + Send + Sync + 'static,
{
    let clients = usecase.list(auth.actor()).await?;
    Ok(Json(clients))
}

pub async fn get_one<C>(
    State(usecase): State<Arc<ClientUseCase<C>>>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, CrudError>
where
    C: ClientRepository + Send + Sync + 'static,
{
    let client = usecase.get(auth.actor(), client_id).await?;
    Ok(Json(client))
}

pub async fn create<C>(
    State(usecase): State<Arc<ClientUseCase<C>>>,
    auth: AuthUser,
    Json(insert_client_model): Json<InsertClientModel>,
) -> Result<impl IntoResponse, CrudError>
where
    C: ClientRepository + Send + Sync + 'static,
{
    let client_id = usecase.create(auth.actor(), insert_client_model).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": client_id }))))
}

pub async fn update<C>(
    State(usecase): State<Arc<ClientUseCase<C>>>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
    Json(update_client_model): Json<UpdateClientModel>,
) -> Result<impl IntoResponse, CrudError>
where
    C: ClientRepository + Send + Sync + 'static,
{
    usecase
        .update(auth.actor(), client_id, update_client_model)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove<C>(
    State(usecase): State<Arc<ClientUseCase<C>>>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, CrudError>
where
    C: ClientRepository + Send + Sync + 'static,
{
    usecase.delete(auth.actor(), client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
