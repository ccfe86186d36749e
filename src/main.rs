mod app;
mod auth;
mod bottles;
mod collections;
mod config;
mod db;
mod error;
mod extract;
mod research;
mod reviews;
mod search;
mod state;
mod tasting_notes;
mod users;

use anyhow::Context;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "drinkshelf=debug,axum=info,tower_http=info,sqlx=warn".to_string()
    });
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    tracing::info!(app = %config.app_name, version = %config.app_version, "starting");

    let state = AppState::init(config).await?;
    db::MIGRATOR
        .run(&state.db)
        .await
        .context("run database migrations")?;

    let config = state.config.clone();
    app::serve(app::build_app(state), &config).await
}
