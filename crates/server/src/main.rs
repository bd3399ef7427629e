use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;
mod middleware;

use config::{AppState, ConfigOverrides, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "command-center")]
#[command(about = "Personal command center dashboard with an MCP gateway for agents", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "command-center.toml")]
    config: PathBuf,

    /// Data directory for storage
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Shared secret required on every API request
    #[arg(long, env = "MCP_SECRET", hide_env_values = true)]
    mcp_secret: Option<String>,

    /// Webhook that receives urgent-task and inbox notifications
    #[arg(long, env = "CC_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Dashboard link included in notifications
    #[arg(long, env = "CC_DASHBOARD_URL")]
    dashboard_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "command_center=info,tower_http=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    tracing::info!("Starting Command Center");
    tracing::info!("Data directory: {}", args.data_dir.display());

    // Load configuration
    let mut config = ServerConfig::load(&args.config, args.data_dir)?;
    config.apply_overrides(ConfigOverrides {
        mcp_secret: args.mcp_secret,
        webhook_url: args.webhook_url,
        dashboard_url: args.dashboard_url,
    });

    let state = AppState::new(&config)?;
    let background = state.background.clone();

    // Start API server
    let addr = format!("{}:{}", args.host, args.port);
    api::serve(&addr, state, shutdown_signal()).await?;

    // Let in-flight notifications and heartbeats finish
    tracing::info!("Waiting for {} background task(s)", background.pending());
    background.drain().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
