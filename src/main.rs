use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use textbook_rag_agent::core::config::env::load_env_files;
use textbook_rag_agent::core::config::AgentConfig;
use textbook_rag_agent::core::logging;
use textbook_rag_agent::server;
use textbook_rag_agent::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = env::current_dir().context("Failed to resolve working directory")?;
    let env_files = load_env_files(&cwd).context("Failed to load .env files")?;

    let config = AgentConfig::from_env().context("Invalid configuration")?;
    logging::init(&config.server);

    for path in &env_files {
        tracing::info!("Loaded environment from {}", path.display());
    }
    tracing::info!("Configuration: {}", config.redacted());

    let bind_addr = config.server.bind_addr();
    let state = AppState::initialize(config).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
