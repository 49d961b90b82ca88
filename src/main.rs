mod catalog;
mod config;
mod extract;
mod gemini;
mod models;
mod pipeline;
mod prompts;
mod routes;
mod session;
mod video;
#[cfg(test)]
mod testing;

use anyhow::Context;
use routes::{router, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use std::sync::Arc;

use crate::{catalog::Catalog, config::AppConfig, gemini::GeminiClient, session::SessionController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env();
    let gemini = GeminiClient::new(config.api_key.clone(), config.api_base.clone());
    match config.key_preview() {
        Some(preview) if gemini.is_configured() => {
            tracing::info!("Using API key: {}...", preview)
        }
        _ => tracing::warn!("GEMINI_API_KEY is not set; generation requests will fail"),
    }
    let session = Arc::new(SessionController::new(Arc::new(gemini), config.model.clone()));
    let catalog = Arc::new(Catalog::bundled().context("loading bundled examples")?);

    if config.preseed_default_example {
        if let Some(example) = catalog.default_example() {
            session.select_example(example);
        }
    }

    let port = config.port;
    let state = AppState { session, catalog, config: Arc::new(config) };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await.context("binding listener")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await
        .context("serving")?;
    Ok(())
}
