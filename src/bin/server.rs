//--------------------------------------------------------------------------------------------------
// Binary entry point: loads the symbol/tick/lot table, spins up the engine
// facade, and serves the HTTP/WebSocket transport over it.
//--------------------------------------------------------------------------------------------------

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use venue_matching::api::{Api, AppState};
use venue_matching::config::{Cli, EngineConfig};
use venue_matching::Engine;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match EngineConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(symbols = config.symbols.len(), "loaded engine configuration");
    let engine = Engine::new(config.symbols.clone(), config.event_buffer);
    let state = Arc::new(AppState::new(engine, config.symbols));
    let api = Api::new(cli.listen, state);

    if let Err(err) = api.serve().await {
        tracing::error!(%err, "server exited with error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
