use tracing_subscriber::EnvFilter;

use project_generator::api;
use project_generator::config::Config;
use project_generator::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    config.validate()?;
    tracing::info!("Search index: {} ({})", config.search.index_name, config.search.endpoint);
    tracing::info!(
        "LLM provider: {} ({}), embeddings={}, completions={}",
        config.llm.provider,
        config.llm.base_url,
        config.llm.embeddings_deployment,
        config.llm.completions_deployment
    );
    if config.function_key.is_none() {
        tracing::warn!("PROJECT_GEN_FUNCTION_KEY is not set; endpoint is unauthenticated");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
