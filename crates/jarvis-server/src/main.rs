use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

mod app;
mod error;
mod http;
mod llm_backend;
mod worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jarvis_server=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path > JARVIS_CONFIG env > ~/.jarvis/jarvis.toml
    let config_path = std::env::var("JARVIS_CONFIG").ok();
    let config = jarvis_core::config::JarvisConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        jarvis_core::config::JarvisConfig::default()
    });

    let bind = config.server.bind.clone();
    let port = config.server.port;
    let state = Arc::new(app::AppState::new(config)?);

    worker::spawn(state.clone());

    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Jarvis server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
