//! Structured tool errors.
//!
//! Every failure of an export tool is reported as a machine-readable body
//! `{error, status_code, message, details?}` instead of a protocol fault.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use domain::models::SearchCriteriaError;
use domain::services::StatusVerdict;
use domain::GatewayError;
use shared::CrnError;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Malformed tenant scope or caller input.
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    /// Non-2xx response or network failure from the MDM API.
    #[error("{message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        original_error: String,
        response_body: Option<String>,
    },

    /// The export exists but has not finished yet.
    #[error("{message}")]
    NotReady {
        message: String,
        export_id: String,
        status: String,
        job_id: String,
    },

    /// The export reached `failed` or `canceled`.
    #[error("{message}")]
    ExportFailed {
        message: String,
        export_id: String,
        status: String,
        job_id: String,
    },

    /// Anything else. The diagnostic is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl ToolError {
    pub fn validation(message: impl Into<String>) -> Self {
        ToolError::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Map a gateway failure for the named operation, e.g. `create export job`.
    pub fn from_gateway(operation: &str, err: GatewayError) -> Self {
        match &err {
            GatewayError::Http { .. } | GatewayError::Network(_) => ToolError::Api {
                message: format!("Failed to {}: {}", operation, err),
                status_code: err.status_code(),
                original_error: err.to_string(),
                response_body: err.response_body().map(str::to_string),
            },
            GatewayError::Decode(_) | GatewayError::Io(_) => {
                ToolError::Internal(format!("{}: {}", operation, err))
            }
        }
    }

    /// Map a status verdict that is not `Ready`.
    pub fn from_verdict(verdict: StatusVerdict) -> Option<Self> {
        let message = verdict.message()?;
        match verdict {
            StatusVerdict::Ready(_) => None,
            StatusVerdict::NotReady {
                export_id,
                status,
                job_id,
            } => Some(ToolError::NotReady {
                message,
                export_id,
                status,
                job_id,
            }),
            StatusVerdict::Failed {
                export_id,
                status,
                job_id,
            } => Some(ToolError::ExportFailed {
                message,
                export_id,
                status,
                job_id,
            }),
        }
    }

    /// The `error` discriminator of the body.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation { .. } => "ValidationError",
            ToolError::Api { .. } => "APIError",
            ToolError::NotReady { .. } => "ExportNotReady",
            ToolError::ExportFailed { .. } => "ExportFailed",
            ToolError::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ToolError::Validation { .. } => 400,
            ToolError::Api { status_code, .. } => status_code.unwrap_or(500),
            ToolError::NotReady { .. } => 202,
            ToolError::ExportFailed { .. } => 400,
            ToolError::Internal(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (message, details) = match self {
            ToolError::Validation { message, details } => (message.clone(), details.clone()),
            ToolError::Api {
                message,
                status_code,
                original_error,
                response_body,
            } => {
                let mut details = json!({ "original_error": original_error });
                if let Some(body) = response_body {
                    details["mdm_response"] = json!(body);
                    details["response_body"] = json!(body);
                }
                if let Some(status) = status_code {
                    details["status_code"] = json!(status);
                }
                (message.clone(), Some(details))
            }
            ToolError::NotReady {
                message,
                export_id,
                status,
                job_id,
            }
            | ToolError::ExportFailed {
                message,
                export_id,
                status,
                job_id,
            } => (
                message.clone(),
                Some(json!({
                    "export_id": export_id,
                    "status": status,
                    "job_id": job_id,
                })),
            ),
            ToolError::Internal(diagnostic) => {
                tracing::error!(error = %diagnostic, "Unexpected tool error");
                ("An unexpected internal error occurred".to_string(), None)
            }
        };

        ErrorBody {
            error: self.kind().to_string(),
            status_code: self.status_code(),
            message,
            details,
        }
    }
}

impl From<validator::ValidationErrors> for ToolError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();

        let message = if details.len() == 1 {
            format!("{}: {}", details[0].field, details[0].message)
        } else {
            format!("{} validation errors", details.len())
        };

        ToolError::Validation {
            message,
            details: Some(json!({ "fields": details })),
        }
    }
}

impl From<CrnError> for ToolError {
    fn from(err: CrnError) -> Self {
        ToolError::validation(format!("Invalid CRN: {}", err))
    }
}

impl From<SearchCriteriaError> for ToolError {
    fn from(err: SearchCriteriaError) -> Self {
        ToolError::validation(format!("Invalid search_criteria: {}", err))
    }
}
