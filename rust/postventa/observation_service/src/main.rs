use anyhow::Context;
use observations::{
    domain::service::ObservationServiceImpl,
    inbound::axum_router::{ObservationRouterState, observation_router},
    outbound::{
        local_file_store::LocalFileStore, observation_pg_repo::ObservationPgRepo,
        sla_config_pg_repo::SlaConfigPgRepo,
    },
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

mod actor_context;
mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().context("expected to be able to generate config")?;

    let db = PgPoolOptions::new()
        .min_connections(3)
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .context("could not connect to db")?;
    tracing::trace!("initialized db connection");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("could not run migrations")?;
    tracing::trace!("ran migrations");

    let service = ObservationServiceImpl::new(
        ObservationPgRepo::new(db.clone()),
        SlaConfigPgRepo::new(db),
        LocalFileStore::new(config.attachment_dir.clone()),
    );
    let app = observation_router(ObservationRouterState::new(service))
        .layer(axum::middleware::from_fn(actor_context::require_actor));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("could not bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "listening");
    axum::serve(listener, app).await.context("server exited")
}
