mod config;
mod error;
mod gemini;
mod generator;
mod models;
mod parser;
mod prompts;
mod reconcile;
mod routes;
mod validation;

use routes::{router, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use std::sync::Arc;

use crate::{config::Settings, gemini::GeminiClient, generator::{GeneratorConfig, IdeaGenerator}};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let settings = Settings::from_env()?;
    let model = GeminiClient::new(settings.gemini_api_key.clone(), settings.gemini_api_base.clone(), settings.gemini_model.clone());
    if model.is_demo() {
        tracing::info!("No GEMINI_API_KEY set, serving templated demo ideas");
    } else {
        tracing::info!(model = %settings.gemini_model, "Using Gemini model");
    }

    let generator = IdeaGenerator::new(
        GeneratorConfig { default_currency: settings.default_currency.clone() },
        Arc::new(model),
    );
    let state = AppState {
        generator: Arc::new(generator),
        profile: Arc::new(settings.profile.clone()),
    };

    let app = router(state);

    let addr = SocketAddr::from(([0,0,0,0], settings.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down");
}
