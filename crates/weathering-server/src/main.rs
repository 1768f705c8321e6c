//! Weathering game server.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod protocol;
mod server;
mod session;
mod weather;

use config::ServerConfig;
use session::GameSessions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    info!(
        weather = ?config.weather.as_ref().map(|w| &w.condition),
        seeded = config.seed.is_some(),
        "Starting Weathering server..."
    );

    let sessions = Arc::new(GameSessions::new(&config));

    server::run_server(config.addr, sessions).await
}
