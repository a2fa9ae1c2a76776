//! Export download materializer.
//!
//! Reads a streamed download response and materializes it in memory or as
//! a file, named after the `Content-Disposition` header.

use std::path::Path;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Response;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use domain::services::{DownloadTarget, DownloadedContent, DownloadedExport};
use domain::GatewayError;

/// Content type reported when the response carries none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upper bound for trusting `Content-Length` when sizing the memory buffer.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

lazy_static::lazy_static! {
    static ref FILENAME_REGEX: regex::Regex =
        regex::Regex::new(r#"filename="?([^";\s]+)"?"#).unwrap();
}

/// File name from a `Content-Disposition` value, falling back to
/// `<export_id>.csv`. Only the final path component of a reported name is
/// kept.
pub fn resolve_file_name(disposition: Option<&str>, export_id: &str) -> String {
    disposition
        .and_then(|value| FILENAME_REGEX.captures(value))
        .and_then(|captures| captures.get(1))
        .and_then(|name| {
            Path::new(name.as_str())
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("{}.csv", export_id))
}

/// Consume a successful download response into the requested target.
pub async fn materialize(
    mut response: Response,
    export_id: &str,
    target: DownloadTarget,
) -> Result<DownloadedExport, GatewayError> {
    let headers = response.headers();
    let file_name = resolve_file_name(
        headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
        export_id,
    );
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let (file_size, content) = match target {
        DownloadTarget::Memory => {
            let hint = response.content_length().unwrap_or(0).min(MAX_PREALLOCATION);
            let mut buffer = Vec::with_capacity(hint as usize);
            while let Some(chunk) = next_chunk(&mut response).await? {
                buffer.extend_from_slice(&chunk);
            }
            (buffer.len() as u64, DownloadedContent::Memory(buffer))
        }
        DownloadTarget::Directory(dir) => {
            let path = dir.join(&file_name);
            let size = stream_to_file(&mut response, &path).await?;
            info!(export_id = %export_id, file_path = %path.display(), file_size = size, "Export file saved");
            (size, DownloadedContent::Disk(path))
        }
    };

    Ok(DownloadedExport {
        export_id: export_id.to_string(),
        file_name,
        content_type,
        file_size,
        content,
    })
}

async fn next_chunk(response: &mut Response) -> Result<Option<Vec<u8>>, GatewayError> {
    response
        .chunk()
        .await
        .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
        .map_err(|e| GatewayError::Network(e.to_string()))
}

/// Write the body chunk by chunk. A partial file is removed on failure.
async fn stream_to_file(response: &mut Response, path: &Path) -> Result<u64, GatewayError> {
    let mut file = tokio::fs::File::create(path).await?;

    let result = async {
        let mut written = 0u64;
        while let Some(chunk) = next_chunk(response).await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok::<u64, GatewayError>(written)
    }
    .await;

    if result.is_err() {
        drop(file);
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(file_path = %path.display(), error = %e, "Could not remove partial export file");
        }
    }
    result
}
