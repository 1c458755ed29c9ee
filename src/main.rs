use tracing_subscriber::EnvFilter;

use loan_advisor::config::Config;
use loan_advisor::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    if config.auth.uses_dev_secret() {
        tracing::warn!("JWT_SECRET is not set; using the development signing secret");
    }
    if config.speech.api_key.is_none() {
        tracing::warn!("SARVAM_API_KEY is not set; translation and voice chat will fail");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config)?;
    let app = loan_advisor::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
