//! `POST /mcp` and `DELETE /mcp`: one JSON-RPC message per request.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::app::AppState;
use crate::mcp::{parse_message, IncomingMessage};

pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

fn session_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `initialize` opens a new session whose id is returned in
/// `Mcp-Session-Id`. Other messages use the header's session, or a
/// throwaway one when it is missing. Only opened sessions keep a tenant.
pub async fn handle_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request = match parse_message(&body) {
        IncomingMessage::Request(request) => request,
        IncomingMessage::Invalid(response) => {
            return (StatusCode::BAD_REQUEST, Json(response)).into_response()
        }
    };

    let opens_session = request.method == "initialize";
    let session_id = match session_header(&headers) {
        Some(id) if !opens_session => id,
        _ => Uuid::new_v4().to_string(),
    };
    if opens_session {
        state.mcp.sessions().open(&session_id).await;
        info!(session_id = %session_id, "Opening MCP session");
    }

    let mut response = match state.mcp.handle(request, &session_id).await {
        Some(rpc_response) => (StatusCode::OK, Json(rpc_response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };

    if opens_session {
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(MCP_SESSION_ID_HEADER), value);
        }
    }
    response
}

pub async fn close_session(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    let Some(session_id) = session_header(&headers) else {
        return StatusCode::BAD_REQUEST;
    };
    let was_open = state.mcp.sessions().remove(&session_id).await;
    debug!(session_id = %session_id, was_open, "MCP session closed");
    StatusCode::NO_CONTENT
}
