//! HTTP front end.
//!
//! [`build_router`] is the one place the route table is assembled; `serve`
//! opens the database, runs pending migrations and listens.

pub mod auth;
pub mod destruction;
pub mod equipment;
pub mod error;
pub mod health;
pub mod pages;
pub mod projects;
pub mod schedule;
pub mod state;
pub mod users;

use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use state::{AppState, Settings};

pub fn build_router(state: AppState) -> Router {
    let max_body = state.settings.max_body_bytes;
    let static_dir = state.settings.static_dir.clone();

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(schedule::routes())
        .merge(users::routes())
        .merge(projects::routes())
        .merge(equipment::routes())
        .merge(destruction::routes())
        .merge(pages::routes(static_dir.as_deref()))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `RUST_LOG` wins over the configured filter.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // a second call (tests, repeated serve) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

pub fn serve(cfg: &Config, bind: Option<String>, port: Option<u16>) -> AppResult<()> {
    init_tracing(&cfg.log_filter);

    let pool = DbPool::new(&cfg.database)?;
    init_db(&pool.conn)?;
    let state = AppState::new(pool.into_inner(), Settings::from_config(cfg));

    let addr = format!(
        "{}:{}",
        bind.unwrap_or_else(|| cfg.bind_address.clone()),
        port.unwrap_or(cfg.port)
    );
    if cfg.dev_auth_stub {
        tracing::warn!("dev auth stub enabled: anonymous requests act as dev-admin");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(%addr, database = %cfg.database, "weeklygrind listening");
        axum::serve(listener, build_router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok::<(), AppError>(())
    })
}
