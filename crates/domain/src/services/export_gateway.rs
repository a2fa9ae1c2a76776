//! Port to the remote export API.
//!
//! Provides the [`ExportGateway`] abstraction used by the export tools and a
//! scripted mock for tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use shared::TenantCrn;

use super::export_request::CreateExportRequest;
use crate::error::GatewayError;
use crate::models::ExportJob;

/// Where a downloaded export file ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// Accumulate the payload in memory.
    Memory,
    /// Stream the payload into a file inside this directory.
    Directory(PathBuf),
}

/// Downloaded payload, in exactly one of the two output modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadedContent {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedExport {
    pub export_id: String,
    /// Name reported by the remote system, or `<export_id>.csv`.
    pub file_name: String,
    pub content_type: String,
    pub file_size: u64,
    pub content: DownloadedContent,
}

/// Remote operations of the export workflow.
///
/// Every call is scoped to one tenant. Implementations must not retry
/// `create_export`.
#[async_trait::async_trait]
pub trait ExportGateway: Send + Sync {
    /// Create an export job. Issued exactly once per call.
    async fn create_export(
        &self,
        crn: &TenantCrn,
        request: &CreateExportRequest,
    ) -> Result<ExportJob, GatewayError>;

    /// Fetch the current job descriptor.
    async fn get_export(&self, crn: &TenantCrn, export_id: &str)
        -> Result<ExportJob, GatewayError>;

    /// Download the job's file. Does not check the job status first.
    async fn download_export(
        &self,
        crn: &TenantCrn,
        export_id: &str,
        target: DownloadTarget,
    ) -> Result<DownloadedExport, GatewayError>;
}

/// Scripted gateway for development and testing.
///
/// Responses are consumed in order; an empty script answers 404.
#[derive(Debug, Default)]
pub struct MockExportGateway {
    create_responses: Mutex<VecDeque<Result<ExportJob, GatewayError>>>,
    status_responses: Mutex<VecDeque<Result<ExportJob, GatewayError>>>,
    download_responses: Mutex<VecDeque<Result<(Option<String>, Vec<u8>), GatewayError>>>,
    created: Mutex<Vec<(String, CreateExportRequest)>>,
}

fn take<T>(queue: &Mutex<VecDeque<Result<T, GatewayError>>>) -> Result<T, GatewayError> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front()
        .unwrap_or_else(|| {
            Err(GatewayError::Http {
                status: 404,
                reason: "Not Found".to_string(),
                url: "mock://data_exports".to_string(),
                body: None,
            })
        })
}

impl MockExportGateway {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer to the next `create_export`.
    pub fn push_create(&self, response: Result<ExportJob, GatewayError>) -> &Self {
        self.create_responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(response);
        self
    }

    /// Queue the answer to the next `get_export`.
    pub fn push_status(&self, response: Result<ExportJob, GatewayError>) -> &Self {
        self.status_responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(response);
        self
    }

    /// Queue the payload of the next `download_export`.
    pub fn push_download(
        &self,
        response: Result<(Option<String>, Vec<u8>), GatewayError>,
    ) -> &Self {
        self.download_responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(response);
        self
    }

    /// Create requests received so far, with the tenant they were scoped to.
    pub fn created_requests(&self) -> Vec<(String, CreateExportRequest)> {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl ExportGateway for MockExportGateway {
    async fn create_export(
        &self,
        crn: &TenantCrn,
        request: &CreateExportRequest,
    ) -> Result<ExportJob, GatewayError> {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((crn.to_string(), request.clone()));
        tracing::info!(tenant_id = %crn.tenant_id(), "Mock: Would create export job");
        take(&self.create_responses)
    }

    async fn get_export(
        &self,
        crn: &TenantCrn,
        export_id: &str,
    ) -> Result<ExportJob, GatewayError> {
        tracing::info!(tenant_id = %crn.tenant_id(), export_id = %export_id, "Mock: Would get export job");
        take(&self.status_responses)
    }

    async fn download_export(
        &self,
        _crn: &TenantCrn,
        export_id: &str,
        target: DownloadTarget,
    ) -> Result<DownloadedExport, GatewayError> {
        let (file_name, bytes) = take(&self.download_responses)?;
        let file_name = file_name.unwrap_or_else(|| format!("{}.csv", export_id));
        let file_size = bytes.len() as u64;

        let content = match target {
            DownloadTarget::Memory => DownloadedContent::Memory(bytes),
            DownloadTarget::Directory(dir) => {
                let path = dir.join(&file_name);
                std::fs::write(&path, &bytes)?;
                DownloadedContent::Disk(path)
            }
        };

        Ok(DownloadedExport {
            export_id: export_id.to_string(),
            file_name,
            content_type: "application/octet-stream".to_string(),
            file_size,
            content,
        })
    }
}
