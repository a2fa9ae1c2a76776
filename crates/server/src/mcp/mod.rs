//! Model Context Protocol (MCP) surface.
//!
//! JSON-RPC 2.0 messages are handled by [`McpServer`] regardless of the
//! transport they arrive on: newline-delimited stdio or `POST /mcp`.

pub mod prompts;
pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    MCP_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
pub use server::McpServer;
pub use transport::serve_stdio;
