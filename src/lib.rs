use std::path::Path;

use crate::auth::hash_password;
use crate::model::{DbConnection, ModelManager, entity::UserEntity};
use crate::utils::{signal::shutdown_signal, uploads::get_uploads_dir};
use crate::workers::ReminderWorker;
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod error;
pub mod learning;
pub mod model;
pub mod utils;
pub mod web;
pub mod workers;

pub static APPLICATION_NAME: &str = "academy";

/// Creates the configured admin account if it doesn't exist yet.
async fn bootstrap_admin(mm: &ModelManager, config: &Config) -> AppResult<()> {
    let Some(admin) = config.app().admin() else {
        return Ok(());
    };

    let hash = hash_password(admin.password())?;
    if UserEntity::ensure_admin(mm, admin.username(), hash).await? {
        tracing::info!(username = admin.username(), "bootstrap admin created");
    }
    Ok(())
}

async fn build_state(db: DbConnection, config: &'static Config) -> AppResult<(AppState, Router)> {
    let mm = ModelManager::new(db);
    bootstrap_admin(&mm, config).await?;

    let uploads_dir = get_uploads_dir(config.uploads().dir())?;
    let state = AppState::new(mm, uploads_dir);
    let app = web::routes::build_app(state.clone(), config);
    Ok((state, app))
}

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = Config::get_or_init(use_local).await;

    let db = DbConnection::connect(config.app().database_uri())?;
    db.migrate(Path::new("./migrations")).await?;

    build_state(db, config).await
}

/// Same as [`build_server`] on an already migrated pool, with the local config.
pub async fn build_server_with_pool(db: DbConnection) -> AppResult<(AppState, Router)> {
    let config = Config::get_or_init(true).await;
    build_state(db, config).await
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (state, app) = build_server().await?;
    let config = Config::get_or_init(false).await;
    let token = CancellationToken::new();

    let reminders = ReminderWorker::new(state.pool().clone(), config.reminders());
    let reminders_handle = tokio::spawn(reminders.run(token.clone()));

    let listener = TcpListener::bind(config.host().bindto()).await?;
    tracing::info!(
        "{APPLICATION_NAME} is starting at: {}",
        config.host().bindto()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(token.clone()))
        .await?;

    token.cancel();
    if let Err(e) = reminders_handle.await {
        error::log_error(&e);
    }
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
