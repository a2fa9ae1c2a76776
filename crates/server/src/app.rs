use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::ExportGateway;

use crate::config::Config;
use crate::mcp::McpServer;
use crate::middleware::trace_id;
use crate::routes::{health, mcp};
use crate::session::{SessionStore, TenantResolver};
use crate::tools::{ExportTools, ToolRegistry};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub mcp: McpServer,
}

/// Wire the MCP server for either transport.
pub fn build_mcp_server(config: &Config, gateway: Arc<dyn ExportGateway>) -> McpServer {
    let sessions = SessionStore::new();
    let resolver = TenantResolver::new(sessions.clone(), config.default_crn());
    let tools = ToolRegistry::new(ExportTools::new(gateway, resolver), config.tools.mode);
    McpServer::new(tools, sessions)
}

pub fn create_app(config: Config, gateway: Arc<dyn ExportGateway>) -> Router {
    let config = Arc::new(config);
    let state = AppState {
        mcp: build_mcp_server(&config, gateway),
        config: config.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/mcp", post(mcp::handle_message).delete(mcp::close_session))
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}
