use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

use mdm_client::DataExportClient;
use mdm_mcp_server::{
    app,
    cli::Cli,
    config::{Config, ServerMode},
    mcp, middleware,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_cli(&cli);
    config.validate()?;

    // Initialize logging
    middleware::init_logging(&config.logging);

    info!(
        mode = ?config.server.mode,
        tools_mode = ?config.tools.mode,
        "Starting MDM MCP server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let client = DataExportClient::new(config.api.clone())
        .context("Failed to build MDM API client")?;
    let gateway = Arc::new(client);

    match config.server.mode {
        ServerMode::Stdio => {
            let server = app::build_mcp_server(&config, gateway);
            let stdin = BufReader::new(tokio::io::stdin());
            mcp::serve_stdio(&server, stdin, tokio::io::stdout()).await?;
        }
        ServerMode::Http => {
            let addr = config.socket_addr()?;
            let app = app::create_app(config, gateway);

            info!("Server listening on {}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
