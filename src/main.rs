//! Dealership - multilingual vehicle dealership storefront

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealership::{
    api::{self, AppState},
    config::Config,
};

/// Environment variable overriding the config file location
const CONFIG_ENV: &str = "DEALERSHIP_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealership=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dealership storefront...");

    // Load configuration
    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yml"));
    let config = Config::load_with_env(&config_path)?;
    tracing::info!("Configuration loaded from {}", config_path.display());
    tracing::info!("Backend API: {}", config.backend.base_url);
    tracing::info!("Default locale: {}", config.i18n.default_locale);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Build application state
    let state = AppState::new(config)?;
    if let Some(path) = state.theme.override_path() {
        tracing::info!("Template overrides loaded from {}", path.display());
    }

    // Build router
    let app = api::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
