use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use survey_api::app::{app, AppState};
use survey_api::cli::{Cli, Command};
use survey_api::config::{config, AppConfig};
use survey_api::database::{open_store, DatabaseManager};
use survey_api::is_production;
use survey_api::services::bootstrap::{ensure_admin, ensure_default_roles};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("survey_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    tracing::info!("Starting Survey API in {:?} mode", config.environment);

    if config.uses_fallback_secret() {
        if is_production!() {
            tracing::error!("JWT_SECRET is not set; tokens are signed with the built-in development secret");
        } else {
            tracing::warn!("JWT_SECRET is not set; using the development fallback secret");
        }
    }

    match cli.command() {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(config).await,
        Command::Seed => seed(config).await,
    }
}

async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let store = open_store(config).await.context("failed to open store")?;
    provision(store.as_ref(), config).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Survey API listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(store)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    tracing::info!("Migrations applied");
    Ok(())
}

async fn seed(config: &AppConfig) -> anyhow::Result<()> {
    let store = open_store(config).await.context("failed to open store")?;
    provision(store.as_ref(), config).await
}

async fn provision(store: &dyn survey_api::database::Store, config: &AppConfig) -> anyhow::Result<()> {
    let created = ensure_default_roles(store).await?;
    if !created.is_empty() {
        tracing::info!("Seeded roles {:?}", created);
    }
    if let Some(admin) = ensure_admin(store, &config.bootstrap).await? {
        tracing::info!("Administrator ready: {} ({})", admin.email, admin.id);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
