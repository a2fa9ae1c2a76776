//! JSON-RPC 2.0 message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revision offered when the client asks for none we support.
pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";

/// Revisions this server can speak, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// The client's revision when supported, otherwise ours.
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|version| {
            SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .copied()
                .find(|supported| *supported == version)
        })
        .unwrap_or(MCP_PROTOCOL_VERSION)
}

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// A request or, when `id` is absent, a notification.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {}", detail))
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self::new(INVALID_REQUEST, format!("Invalid request: {}", detail))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {}", detail))
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::new(INTERNAL_ERROR, format!("Internal error: {}", detail))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    /// `null` when the request id could not be read.
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Outcome of reading one raw message.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    /// Unreadable message, answered with this error response.
    Invalid(JsonRpcResponse),
}

/// Parse a single JSON-RPC message. Batches are not supported.
pub fn parse_message(raw: &str) -> IncomingMessage {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            return IncomingMessage::Invalid(JsonRpcResponse::error(
                Value::Null,
                JsonRpcError::parse_error(e),
            ))
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    if !value.is_object() {
        return IncomingMessage::Invalid(JsonRpcResponse::error(
            Value::Null,
            JsonRpcError::invalid_request("expected a single JSON object"),
        ));
    }

    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) if request.jsonrpc == JSONRPC_VERSION => IncomingMessage::Request(request),
        Ok(request) => IncomingMessage::Invalid(JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_request(format!("unsupported jsonrpc version '{}'", request.jsonrpc)),
        )),
        Err(e) => IncomingMessage::Invalid(JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_request(e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request() {
        let msg = parse_message(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        match msg {
            IncomingMessage::Request(request) => {
                assert_eq!(request.id, Some(json!(1)));
                assert_eq!(request.method, "ping");
                assert!(!request.is_notification());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negotiate_protocol_version() {
        assert_eq!(negotiate_protocol_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_protocol_version(Some("2099-01-01")), MCP_PROTOCOL_VERSION);
        assert_eq!(negotiate_protocol_version(None), MCP_PROTOCOL_VERSION);
    }

    #[test]
    fn test_parse_notification() {
        let msg = parse_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
        assert!(matches!(msg, IncomingMessage::Request(r) if r.is_notification()));
    }

    #[test]
    fn test_parse_error() {
        let IncomingMessage::Invalid(response) = parse_message("{not json") else {
            panic!("expected parse error");
        };
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);
    }

    #[test]
    fn test_batch_is_invalid_request() {
        let IncomingMessage::Invalid(response) =
            parse_message(r#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#)
        else {
            panic!("expected invalid request");
        };
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn test_missing_method_keeps_id() {
        let IncomingMessage::Invalid(response) = parse_message(r#"{"jsonrpc":"2.0","id":"a"}"#)
        else {
            panic!("expected invalid request");
        };
        assert_eq!(response.id, json!("a"));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn test_wrong_version() {
        let IncomingMessage::Invalid(response) =
            parse_message(r#"{"jsonrpc":"1.0","id":2,"method":"ping"}"#)
        else {
            panic!("expected invalid request");
        };
        assert_eq!(response.id, json!(2));
    }

    #[test]
    fn test_response_serialization() {
        let ok = serde_json::to_value(JsonRpcResponse::success(json!(1), json!({}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));

        let err = serde_json::to_value(JsonRpcResponse::error(
            json!(1),
            JsonRpcError::method_not_found("foo"),
        ))
        .unwrap();
        assert_eq!(err["error"]["code"], -32601);
        assert!(err.get("result").is_none());
    }
}
