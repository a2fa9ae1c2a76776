//! Common test utilities for integration tests.
//!
//! Builds the HTTP app against a wiremock server standing in for the MDM API.

// Helpers are shared by several test binaries; not every one uses all of them.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use mdm_client::{DataExportClient, MdmClientConfig};
use mdm_mcp_server::{
    app::create_app,
    config::{
        Config, LoggingConfig, ServerConfig, ServerMode, TenantConfig, ToolsConfig, ToolsMode,
    },
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_CRN: &str = "crn:v1:bluemix:public:mdm:us-south:a/123:tenant-1::";

/// Test configuration pointing at `base_url`, with the test tenant as default.
pub fn test_config(base_url: &str) -> Config {
    let mut api = MdmClientConfig::new(base_url);
    api.api_key = Some("test-key".to_string());
    api.retry_backoff_ms = 1;

    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: 30,
            mode: ServerMode::Http,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        api,
        tenant: TenantConfig {
            default_crn: Some(TEST_CRN.to_string()),
        },
        tools: ToolsConfig {
            mode: ToolsMode::Full,
        },
    }
}

pub fn create_test_app(config: Config) -> Router {
    let gateway = Arc::new(DataExportClient::new(config.api.clone()).unwrap());
    create_app(config, gateway)
}

/// A JSON-RPC request frame.
pub fn rpc(id: i64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

pub fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    rpc(id, "tools/call", json!({"name": name, "arguments": arguments}))
}

pub fn mcp_request(body: Value, session_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(session_id) = session_id {
        builder = builder.header("Mcp-Session-Id", session_id);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Send one tool call and return the `CallToolResult`.
pub async fn call_tool(app: &Router, name: &str, arguments: Value) -> Value {
    let response = app
        .clone()
        .oneshot(mcp_request(tool_call(1, name, arguments), None))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    body["result"].clone()
}
