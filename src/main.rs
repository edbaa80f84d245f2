//! ALMA-Archive-RS: ALMA archive query tools for agents
//!
//! This is the main entry point for the application.

use alma_archive_rs::{
    backends::BackendLoader,
    config,
    dispatch::Dispatcher,
    network::HttpClient,
    web::{create_router, AppState},
};
use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const ENVIRONMENT_HELP: &str = "\
ENVIRONMENT VARIABLES:
    ALMA_SETTINGS_PATH     Path to settings.yml
    ALMA_DEBUG             Enable debug logging (true/false)
    ALMA_PORT              Server port
    ALMA_BIND_ADDRESS      Bind address
    ALMA_TAP_URL           ALMA TAP service base URL
    ALMA_SIMBAD_URL        SIMBAD TAP service base URL
    RUST_LOG               Log filter (overrides ALMA_DEBUG)";

#[derive(Parser)]
#[command(name = "alma-archive-rs", version)]
#[command(about = "ALMA archive query tools behind an agent-facing protocol server", long_about = None)]
#[command(after_help = ENVIRONMENT_HELP)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let settings = config::load(args.config)?;

    // Initialize logging
    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting ALMA-Archive-RS v{}", alma_archive_rs::VERSION);
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    // Load backends and freeze their availability
    let loaded = BackendLoader::load(&settings, &client).await?;
    info!("Loaded {} backends", loaded.registry.len());

    let dispatcher = Dispatcher::from_settings(Arc::new(loaded.registry), loaded.availability, &settings);

    // Create application state
    let state = AppState::new(settings.clone(), dispatcher);

    // Create router
    let app = create_router(state);

    // Bind address
    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    info!("Starting server on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
