use crate::{
    auth::AuthUser,
    detail_cache::DetailCache,
    usecases::{crud_error::CrudError, mailings::MailingUseCase},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use crates::{
    application::usecases::mailing_dispatch::{DispatchSettings, MailingDispatchUseCase},
    domain::value_objects::{
        iam::AccessPolicy,
        mailings::{BlockMailingModel, InsertMailingModel, MailingDetailModel, UpdateMailingModel},
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                clients::ClientPostgres, mailing_attempts::MailingAttemptPostgres,
                mailings::MailingPostgres, messages::MessagePostgres,
            },
        },
        mail::smtp::SmtpMailTransport,
    },
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

type PgMailingUseCase = MailingUseCase<
    MailingPostgres,
    MessagePostgres,
    ClientPostgres,
    MailingAttemptPostgres,
    SmtpMailTransport,
>;

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    transport: Arc<SmtpMailTransport>,
    settings: DispatchSettings,
    policy: Arc<dyn AccessPolicy>,
    detail_cache: DetailCache<MailingDetailModel>,
) -> Router {
    let mailing_repository = Arc::new(MailingPostgres::new(Arc::clone(&db_pool)));
    let attempt_repository = Arc::new(MailingAttemptPostgres::new(Arc::clone(&db_pool)));

    let dispatcher = MailingDispatchUseCase::new(
        Arc::clone(&mailing_repository),
        Arc::clone(&attempt_repository),
        transport,
        settings,
    );

    let mailing_usecase = MailingUseCase::new(
        mailing_repository,
        Arc::new(MessagePostgres::new(Arc::clone(&db_pool))),
        Arc::new(ClientPostgres::new(Arc::clone(&db_pool))),
        attempt_repository,
        Arc::new(dispatcher),
        policy,
        detail_cache,
    );

    Router::new()
        .route("/", get(list).post(create))
        .route("/:mailing_id", get(get_one).put(update).delete(remove))
        .route("/:mailing_id/dispatch", post(dispatch))
        .route("/:mailing_id/block", put(set_blocked))
        .route("/:mailing_id/attempts", get(attempts))
        .with_state(Arc::new(mailing_usecase))
}

pub async fn list(
    State(usecase): State<Arc<PgMailingUseCase>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, CrudError> {
    let mailings = usecase.list(auth.actor()).await?;
    Ok(Json(mailings))
}

pub async fn get_one(
    State(usecase): State<Arc<PgMailingUseCase>>,
    auth: AuthUser,
    Path(mailing_id): Path<Uuid>,
) -> Result<impl IntoResponse, CrudError> {
    let detail = usecase.get(auth.actor(), mailing_id).await?;
    Ok(Json(detail))
}

pub async fn create(
    State(usecase): State<Arc<PgMailingUseCase>>,
    auth: AuthUser,
    Json(insert_mailing_model): Json<InsertMailingModel>,
) -> Result<impl IntoResponse, CrudError> {
    let mailing_id = usecase.create(auth.actor(), insert_mailing_model).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": mailing_id }))))
}

pub async fn update(
    State(usecase): State<Arc<PgMailingUseCase>>,
    auth: AuthUser,
    Path(mailing_id): Path<Uuid>,
    Json(update_mailing_model): Json<UpdateMailingModel>,
) -> Result<impl IntoResponse, CrudError> {
    usecase
        .update(auth.actor(), mailing_id, update_mailing_model)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    State(usecase): State<Arc<PgMailingUseCase>>,
    auth: AuthUser,
    Path(mailing_id): Path<Uuid>,
) -> Result<impl IntoResponse, CrudError> {
    usecase.delete(auth.actor(), mailing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn dispatch(
    State(usecase): State<Arc<PgMailingUseCase>>,
    auth: AuthUser,
    Path(mailing_id): Path<Uuid>,
) -> Result<impl IntoResponse, CrudError> {
    let report = usecase.dispatch(auth.actor(), mailing_id).await?;
    Ok(Json(report))
}

pub async fn set_blocked(
    State(usecase): State<Arc<PgMailingUseCase>>,
    auth: AuthUser,
    Path(mailing_id): Path<Uuid>,
    Json(block_mailing_model): Json<BlockMailingModel>,
) -> Result<impl IntoResponse, CrudError> {
    usecase
        .set_blocked(auth.actor(), mailing_id, block_mailing_model.is_blocked)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn attempts(
    State(usecase): State<Arc<PgMailingUseCase>>,
    auth: AuthUser,
    Path(mailing_id): Path<Uuid>,
) -> Result<impl IntoResponse, CrudError> {
    let attempts = usecase.attempts(auth.actor(), mailing_id).await?;
    Ok(Json(attempts))
}
