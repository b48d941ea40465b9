use crate::{
    auth::AuthUser,
    usecases::{crud_error::CrudError, messages::MessageUseCase},
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
        repositories::messages::MessageRepository,
        value_objects::{
            iam::AccessPolicy,
            messages::{InsertMessageModel, UpdateMessageModel},
        },
    },
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::messages::MessagePostgres},
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub fn routes(db_pool: Arc<PgPoolSquad>, policy: Arc<dyn AccessPolicy>) -> Router {
    let message_repository = MessagePostgres::new(Arc::clone(&db_pool));
    let message_usecase = MessageUseCase::new(Arc::new(message_repository), policy);

    Router::new()
        .route(
            "/",
            get(list::<MessagePostgres>).post(create::<MessagePostgres>),
        )
        .route(
            "/:message_id",
            get(get_one::<MessagePostgres>)
                .put(update::<MessagePostgres>)
                .delete(remove::<MessagePostgres>),
        )
        .with_state(Arc::new(message_usecase))
}

pub async fn list<M>(
    State(usecase): State<Arc<MessageUseCase<M>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, CrudError>
where
    M: MessageRepository + Send + Sync + 'static,
{
    let messages = usecase.list(auth.actor()).await?;
    Ok(Json(messages))
}

pub async fn get_one<M>(
    State(usecase): State<Arc<MessageUseCase<M>>>,
    auth: AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, CrudError>
where
    M: MessageRepository + Send + Sync + 'static,
{
    let message = usecase.get(auth.actor(), message_id).await?;
    Ok(Json(message))
}

pub async fn create<M>(
    State(usecase): State<Arc<MessageUseCase<M>>>,
    auth: AuthUser,
    Json(insert_message_model): Json<InsertMessageModel>,
) -> Result<impl IntoResponse, CrudError>
where
    M: MessageRepository + Send + Sync + 'static,
{
    let message_id = usecase.create(auth.actor(), insert_message_model).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": message_id }))))
}

pub async fn update<M>(
    State(usecase): State<Arc<MessageUseCase<M>>>,
    auth: AuthUser,
    Path(message_id): Path<Uuid>,
    Json(update_message_model): Json<UpdateMessageModel>,
) -> Result<impl IntoResponse, CrudError>
where
    M: MessageRepository + Send + Sync + 'static,
{
    usecase
        .update(auth.actor(), message_id, update_message_model)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove<M>(
    State(usecase): State<Arc<MessageUseCase<M>>>,
    auth: AuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, CrudError>
where
    M: MessageRepository + Send + Sync + 'static,
{
    usecase.delete(auth.actor(), message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
