//! Data export tools: create, poll and download.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use domain::models::{Compression, FileFormat, SearchCriteria, SearchCriteriaError};
use domain::services::{
    build_export_request, interpret, DownloadTarget, DownloadedContent, DownloadedExport,
    ExportGateway, ExportRequestInput, StatusVerdict,
};
use shared::encoding::encode_payload;

use crate::error::ToolError;
use crate::session::TenantResolver;

pub const CREATE_DATA_EXPORT: &str = "create_data_export";
pub const GET_DATA_EXPORT: &str = "get_data_export";
pub const DOWNLOAD_DATA_EXPORT: &str = "download_data_export";

/// Arguments of `create_data_export`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateDataExportInput {
    /// `entity` or `record`; anything else falls back to `entity`.
    pub export_type: Option<String>,
    pub data_type: Option<String>,
    #[validate(custom(function = "validate_file_format"))]
    pub file_format: Option<String>,
    #[validate(custom(function = "validate_compression"))]
    pub compression_type: Option<String>,
    pub search_criteria: Option<Value>,
    pub file_name: Option<String>,
    #[validate(custom(function = "validate_updated_after"))]
    pub include_only_updated_after: Option<String>,
    pub crn: Option<String>,
}

/// Arguments of `get_data_export`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GetDataExportInput {
    #[validate(custom(function = "shared::validation::validate_export_id"))]
    pub export_id: String,
    pub crn: Option<String>,
}

/// Arguments of `download_data_export`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DownloadDataExportInput {
    #[validate(custom(function = "shared::validation::validate_export_id"))]
    pub export_id: String,
    pub crn: Option<String>,
    /// Existing directory to stream the file into. Memory mode when absent.
    pub save_to_path: Option<String>,
}

/// Result of `download_data_export`. Carries exactly one of
/// `file_content_base64` and `file_path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadDataExportOutput {
    pub export_id: String,
    pub file_name: String,
    pub content_type: String,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_content_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub status: &'static str,
}

impl From<DownloadedExport> for DownloadDataExportOutput {
    fn from(download: DownloadedExport) -> Self {
        let (file_content_base64, file_path) = match &download.content {
            DownloadedContent::Memory(bytes) => (Some(encode_payload(bytes)), None),
            DownloadedContent::Disk(path) => (None, Some(path.display().to_string())),
        };

        Self {
            export_id: download.export_id,
            file_name: download.file_name,
            content_type: download.content_type,
            file_size: download.file_size,
            file_content_base64,
            file_path,
            status: "downloaded",
        }
    }
}

fn validate_file_format(value: &str) -> Result<(), validator::ValidationError> {
    value.parse::<FileFormat>().map(|_| ()).map_err(|message| {
        validator::ValidationError::new("file_format").with_message(message.into())
    })
}

fn validate_compression(value: &str) -> Result<(), validator::ValidationError> {
    value.parse::<Compression>().map(|_| ()).map_err(|message| {
        validator::ValidationError::new("compression_type").with_message(message.into())
    })
}

fn validate_updated_after(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    shared::validation::validate_rfc3339(value)
}

impl CreateDataExportInput {
    /// Parse the closed value sets and the optional criteria tree.
    pub fn to_request_input(&self) -> Result<ExportRequestInput, ToolError> {
        let file_format = self
            .file_format
            .as_deref()
            .map(str::parse::<FileFormat>)
            .transpose()
            .map_err(ToolError::validation)?
            .unwrap_or_default();

        let compression = self
            .compression_type
            .as_deref()
            .map(str::parse::<Compression>)
            .transpose()
            .map_err(ToolError::validation)?
            .unwrap_or_default();

        let search_criteria = match &self.search_criteria {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<SearchCriteria>(value.clone())
                    .map_err(|e| SearchCriteriaError::Malformed(e.to_string()))?,
            ),
        };

        Ok(ExportRequestInput {
            export_type: self.export_type.clone(),
            data_type: self.data_type.clone(),
            file_format,
            compression,
            search_criteria,
            file_name: self.file_name.clone(),
            include_only_updated_after: self.include_only_updated_after.clone(),
        })
    }
}

/// Handlers behind the three export tools.
#[derive(Clone)]
pub struct ExportTools {
    gateway: Arc<dyn ExportGateway>,
    resolver: TenantResolver,
}

impl ExportTools {
    pub fn new(gateway: Arc<dyn ExportGateway>, resolver: TenantResolver) -> Self {
        Self { gateway, resolver }
    }

    pub async fn create_data_export(
        &self,
        session_id: &str,
        input: CreateDataExportInput,
    ) -> Result<Value, ToolError> {
        input.validate()?;
        let request = build_export_request(&input.to_request_input()?)?;
        let tenant = self
            .resolver
            .resolve(session_id, input.crn.as_deref())
            .await?;

        let job = self
            .gateway
            .create_export(&tenant.crn, &request)
            .await
            .map_err(|e| ToolError::from_gateway("create export job", e))?;

        info!(
            session_id = %session_id,
            tenant_id = %tenant.tenant_id,
            export_id = %job.job_id,
            status = %job.status,
            "Export job created"
        );
        to_value(&job)
    }

    /// Returns the job only once it succeeded; every other status is a
    /// structured not-ready or failed error.
    pub async fn get_data_export(
        &self,
        session_id: &str,
        input: GetDataExportInput,
    ) -> Result<Value, ToolError> {
        input.validate()?;
        let export_id = input.export_id.trim();
        let tenant = self
            .resolver
            .resolve(session_id, input.crn.as_deref())
            .await?;

        let job = self
            .gateway
            .get_export(&tenant.crn, export_id)
            .await
            .map_err(|e| ToolError::from_gateway(&format!("get export {}", export_id), e))?;

        match interpret(export_id, job) {
            StatusVerdict::Ready(job) => {
                info!(tenant_id = %tenant.tenant_id, export_id = %export_id, "Export ready");
                to_value(&job)
            }
            verdict => Err(ToolError::from_verdict(verdict).unwrap_or_else(|| {
                ToolError::Internal(format!("no error for verdict of export {}", export_id))
            })),
        }
    }

    pub async fn download_data_export(
        &self,
        session_id: &str,
        input: DownloadDataExportInput,
    ) -> Result<Value, ToolError> {
        input.validate()?;
        let export_id = input.export_id.trim();
        let target = download_target(input.save_to_path.as_deref())?;
        let tenant = self
            .resolver
            .resolve(session_id, input.crn.as_deref())
            .await?;

        let download = self
            .gateway
            .download_export(&tenant.crn, export_id, target)
            .await
            .map_err(|e| ToolError::from_gateway(&format!("download export {}", export_id), e))?;

        info!(
            tenant_id = %tenant.tenant_id,
            export_id = %export_id,
            file_name = %download.file_name,
            file_size = download.file_size,
            "Export downloaded"
        );
        to_value(&DownloadDataExportOutput::from(download))
    }
}

fn download_target(save_to_path: Option<&str>) -> Result<DownloadTarget, ToolError> {
    match save_to_path.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(DownloadTarget::Memory),
        Some(raw) => {
            let dir = PathBuf::from(raw);
            if !dir.is_dir() {
                return Err(ToolError::validation(format!(
                    "save_to_path must be an existing directory: {}",
                    raw
                )));
            }
            Ok(DownloadTarget::Directory(dir))
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Internal(e.to_string()))
}

/// JSON input schemas published through `tools/list`.
pub fn create_data_export_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "export_type": {
                "type": "string",
                "enum": ["entity", "record"],
                "default": "entity",
                "description": "Export golden entities or source records"
            },
            "data_type": {
                "type": "string",
                "description": "Entity or record type to export, e.g. person. All types when omitted"
            },
            "file_format": {
                "type": "string",
                "enum": ["csv", "tsv", "psv", "json"],
                "default": "csv"
            },
            "compression_type": {
                "type": "string",
                "enum": ["zip", "tar", "tgz", "none"],
                "default": "zip"
            },
            "search_criteria": {
                "type": "object",
                "description": "Search criteria with search_type, query and filters. Defaults to every entity or record"
            },
            "file_name": { "type": "string" },
            "include_only_updated_after": {
                "type": "string",
                "format": "date-time",
                "description": "Only export data updated after this RFC 3339 timestamp"
            },
            "crn": {
                "type": "string",
                "description": "Tenant CRN. Defaults to the session or configured tenant"
            }
        }
    })
}

pub fn get_data_export_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "export_id": { "type": "string", "description": "Job id returned by create_data_export" },
            "crn": { "type": "string" }
        },
        "required": ["export_id"]
    })
}

pub fn download_data_export_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "export_id": { "type": "string" },
            "crn": { "type": "string" },
            "save_to_path": {
                "type": "string",
                "description": "Existing directory to save the file in. The file is returned base64 encoded when omitted"
            }
        },
        "required": ["export_id"]
    })
}
