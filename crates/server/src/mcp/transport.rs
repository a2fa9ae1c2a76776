//! Newline-delimited JSON-RPC over stdio.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

use super::server::McpServer;

/// Serve one session until the reader reaches end of input.
///
/// Each line is one message; each response is written as one line.
pub async fn serve_stdio<R, W>(server: &McpServer, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let session_id = Uuid::new_v4().to_string();
    server.sessions().open(&session_id).await;
    info!(session_id = %session_id, "Serving MCP over stdio");

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(response) = server.handle_raw(line, &session_id).await else {
            continue;
        };

        let mut frame = match serde_json::to_string(&response) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Could not serialize JSON-RPC response");
                continue;
            }
        };
        frame.push('\n');
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await?;
    }

    server.sessions().remove(&session_id).await;
    info!(session_id = %session_id, "stdin closed, stopping");
    Ok(())
}
