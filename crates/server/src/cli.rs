use clap::Parser;

use crate::config::ServerMode;

#[derive(Debug, Parser)]
#[command(name = "mdm-mcp-server")]
#[command(about = "MCP server exposing the MDM data export workflow as tools")]
#[command(version)]
pub struct Cli {
    /// Transport to serve (overrides server.mode)
    #[arg(short, long, value_enum)]
    pub mode: Option<ServerMode>,

    /// Port to listen on in http mode (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}
