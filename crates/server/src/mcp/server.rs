//! MCP method dispatch.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::ToolError;
use crate::session::SessionStore;
use crate::tools::{ToolContext, ToolRegistry};

use super::prompts;
use super::protocol::{
    negotiate_protocol_version, parse_message, IncomingMessage, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse,
};

pub const SERVER_NAME: &str = "mdm-mcp-server";

#[derive(Debug, Deserialize)]
struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    protocol_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
}

/// Transport-independent MCP server.
#[derive(Clone)]
pub struct McpServer {
    tools: ToolRegistry,
    sessions: SessionStore,
}

impl McpServer {
    pub fn new(tools: ToolRegistry, sessions: SessionStore) -> Self {
        Self { tools, sessions }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one raw message. `None` when nothing must be sent back.
    pub async fn handle_raw(&self, raw: &str, session_id: &str) -> Option<JsonRpcResponse> {
        match parse_message(raw) {
            IncomingMessage::Request(request) => self.handle(request, session_id).await,
            IncomingMessage::Invalid(response) => {
                warn!(session_id = %session_id, "Rejected malformed JSON-RPC message");
                Some(response)
            }
        }
    }

    /// Handle a parsed request. Notifications never produce a response.
    pub async fn handle(
        &self,
        request: JsonRpcRequest,
        session_id: &str,
    ) -> Option<JsonRpcResponse> {
        debug!(session_id = %session_id, method = %request.method, "Handling MCP message");

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request, session_id);
            return None;
        };

        let params = request.params.unwrap_or(Value::Null);
        let result = match request.method.as_str() {
            "initialize" => self.initialize(params, session_id),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.definitions() })),
            "tools/call" => self.call_tool(params, session_id).await,
            "prompts/list" => Ok(json!({ "prompts": prompts::definitions() })),
            "prompts/get" => get_prompt(params),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&self, request: &JsonRpcRequest, session_id: &str) {
        match request.method.as_str() {
            "notifications/initialized" => {
                info!(session_id = %session_id, "Client initialized")
            }
            other => debug!(session_id = %session_id, method = %other, "Ignoring notification"),
        }
    }

    fn initialize(&self, params: Value, session_id: &str) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = if params.is_null() {
            InitializeParams {
                protocol_version: None,
            }
        } else {
            serde_json::from_value(params).map_err(JsonRpcError::invalid_params)?
        };
        let protocol_version = negotiate_protocol_version(params.protocol_version.as_deref());
        if let Some(requested) = params
            .protocol_version
            .as_deref()
            .filter(|requested| *requested != protocol_version)
        {
            warn!(session_id = %session_id, requested = %requested, offered = %protocol_version, "Unsupported protocol version requested");
        }

        info!(session_id = %session_id, protocol_version = %protocol_version, "MCP session initialized");
        Ok(json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": { "listChanged": false },
                "prompts": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    async fn call_tool(&self, params: Value, session_id: &str) -> Result<Value, JsonRpcError> {
        let params: CallToolParams =
            serde_json::from_value(params).map_err(JsonRpcError::invalid_params)?;

        let ctx = ToolContext {
            session_id: session_id.to_string(),
        };
        let outcome = self
            .tools
            .call(&params.name, params.arguments, &ctx)
            .await
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        Ok(match outcome {
            Ok(value) => tool_result(value, false),
            Err(err) => {
                let body = err.to_body();
                log_tool_error(&params.name, session_id, &err);
                tool_result(serde_json::to_value(&body).map_err(JsonRpcError::internal)?, true)
            }
        })
    }
}

fn get_prompt(params: Value) -> Result<Value, JsonRpcError> {
    let params: GetPromptParams =
        serde_json::from_value(params).map_err(JsonRpcError::invalid_params)?;
    prompts::get(&params.name)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown prompt: {}", params.name)))
}

/// MCP `CallToolResult` carrying the value as text and as structured content.
fn tool_result(value: Value, is_error: bool) -> Value {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": value,
        "isError": is_error
    })
}

fn log_tool_error(tool: &str, session_id: &str, err: &ToolError) {
    match err {
        ToolError::NotReady { .. } => {
            debug!(tool = %tool, session_id = %session_id, error = %err, "Export not ready")
        }
        ToolError::Internal(_) => {}
        _ => warn!(
            tool = %tool,
            session_id = %session_id,
            kind = err.kind(),
            status_code = err.status_code(),
            error = %err,
            "Tool call failed"
        ),
    }
}
