use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bookshelf_api::config;
use bookshelf_api::database::DatabaseManager;
use bookshelf_api::server;
use bookshelf_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")))
        .init();

    let config = config::config().clone();
    tracing::info!(
        environment = config.environment.as_str(),
        database = %DatabaseManager::describe_url(&config.database.url),
        "starting bookshelf api"
    );

    let db = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    if config.database.run_migrations {
        db.migrate().await.context("failed to apply migrations")?;
    }

    let state = AppState::postgres(config, db.clone());
    let result = server::serve(state).await;

    db.close().await;
    result
}
