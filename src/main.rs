use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing_subscriber::EnvFilter;

use posts_api::config::{AppConfig, StorageBackend};
use posts_api::database::{connection::get_db_client, MongoPostStore, MongoUserStore};
use posts_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let app_state = initialize_app_state(config).await?;

    if let Err(e) = app_state.images.ensure_dir().await {
        tracing::warn!("Failed to create {}: {}", app_state.images.dir().display(), e);
    }

    let addr = app_state.config.bind_address();
    let app = build_router(app_state);
    start_server(app, &addr).await
}

async fn initialize_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Ok(AppState::in_memory(config))
        }
        StorageBackend::Mongo => {
            let db = get_db_client(&config)
                .await
                .context("Failed to connect to MongoDB")?;

            let posts = MongoPostStore::new(db.clone());
            let users = MongoUserStore::new(&db);

            if let Err(e) = posts.ensure_indexes().await {
                tracing::warn!("Failed to create post indexes: {}", e);
            }
            users
                .ensure_indexes()
                .await
                .context("Failed to create the unique email index")?;

            Ok(AppState::new(config, Arc::new(posts), Arc::new(users)))
        }
    }
}

async fn start_server(app: Router, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("🚀 Server starting on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
