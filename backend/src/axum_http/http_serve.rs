use crate::{
    auth::JwtSecret,
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    detail_cache::DetailCache,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    application::usecases::mailing_dispatch::DispatchSettings,
    domain::value_objects::iam::{AccessPolicy, OwnerPolicy},
    infra::{
        db::postgres::postgres_connection::PgPoolSquad,
        mail::smtp::SmtpMailTransport,
    },
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let transport = Arc::new(SmtpMailTransport::new(config.smtp.transport_config())?);
    let settings = DispatchSettings {
        sender: config.smtp.from.clone(),
        send_timeout: Duration::from_secs(config.dispatch.send_timeout),
    };
    let policy: Arc<dyn AccessPolicy> = Arc::new(OwnerPolicy);
    let detail_cache = DetailCache::new(Duration::from_secs(config.detail_cache.ttl));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/clients",
            routers::clients::routes(Arc::clone(&db_pool), Arc::clone(&policy)),
        )
        .nest(
            "/api/v1/messages",
            routers::messages::routes(Arc::clone(&db_pool), Arc::clone(&policy)),
        )
        .nest(
            "/api/v1/mailings",
            routers::mailings::routes(
                Arc::clone(&db_pool),
                transport,
                settings,
                Arc::clone(&policy),
                detail_cache,
            ),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(JwtSecret(Arc::new(config.auth.jwt_secret.clone()))))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "backend: failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "backend: failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
