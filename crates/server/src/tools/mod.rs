//! Tool registry.
//!
//! Maps tool names to their schemas and handlers. Which tools exist depends
//! on the configured [`ToolsMode`].

pub mod data_exports;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ToolsMode;
use crate::error::ToolError;

pub use data_exports::{
    CreateDataExportInput, DownloadDataExportInput, DownloadDataExportOutput, ExportTools,
    GetDataExportInput, CREATE_DATA_EXPORT, DOWNLOAD_DATA_EXPORT, GET_DATA_EXPORT,
};

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Per-call context handed to every tool.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub session_id: String,
}

#[derive(Clone)]
pub struct ToolRegistry {
    exports: ExportTools,
    mode: ToolsMode,
}

impl ToolRegistry {
    pub fn new(exports: ExportTools, mode: ToolsMode) -> Self {
        Self { exports, mode }
    }

    fn export_tools_enabled(&self) -> bool {
        self.mode == ToolsMode::Full
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        if !self.export_tools_enabled() {
            return Vec::new();
        }

        vec![
            ToolDefinition {
                name: CREATE_DATA_EXPORT,
                description: "Create an asynchronous data export job for entities or records. \
                    Returns the job descriptor; poll it with get_data_export.",
                input_schema: data_exports::create_data_export_schema(),
            },
            ToolDefinition {
                name: GET_DATA_EXPORT,
                description: "Get the status of a data export job. Returns the job once it \
                    succeeded, otherwise an ExportNotReady or ExportFailed error.",
                input_schema: data_exports::get_data_export_schema(),
            },
            ToolDefinition {
                name: DOWNLOAD_DATA_EXPORT,
                description: "Download the file of a succeeded data export job, base64 encoded \
                    or saved to a directory.",
                input_schema: data_exports::download_data_export_schema(),
            },
        ]
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.definitions().iter().any(|tool| tool.name == name)
    }

    /// Run a tool. `None` when no tool of that name is registered.
    pub async fn call(
        &self,
        name: &str,
        arguments: Value,
        ctx: &ToolContext,
    ) -> Option<Result<Value, ToolError>> {
        if !self.has_tool(name) {
            return None;
        }

        let session_id = ctx.session_id.as_str();
        let result = match name {
            CREATE_DATA_EXPORT => match parse_arguments(name, arguments) {
                Ok(input) => self.exports.create_data_export(session_id, input).await,
                Err(e) => Err(e),
            },
            GET_DATA_EXPORT => match parse_arguments(name, arguments) {
                Ok(input) => self.exports.get_data_export(session_id, input).await,
                Err(e) => Err(e),
            },
            DOWNLOAD_DATA_EXPORT => match parse_arguments(name, arguments) {
                Ok(input) => self.exports.download_data_export(session_id, input).await,
                Err(e) => Err(e),
            },
            _ => return None,
        };
        Some(result)
    }
}

/// Missing arguments count as an empty object.
fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::validation(format!("Invalid arguments for {}: {}", tool, e)))
}
