use anyhow::Context;
use hestia_panel_rust::config::config;
use hestia_panel_rust::is_production;
use hestia_panel_rust::server::{app, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, HESTIA_*, AAPANEL_*, etc.
    let _ = dotenvy::dotenv();

    let default_filter = if is_production!() { "info" } else { "debug" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    tracing::info!("Starting Hestia Panel API in {:?} mode", config.environment);

    let state = AppState::from_config(config)?;
    let app = app(state, &config.api);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Hestia Panel API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
