//! Prompts offered through `prompts/list` and `prompts/get`.

use serde::Serialize;
use serde_json::{json, Value};

pub const EXPORT_ASSISTANT_PROMPT: &str = "mdm_export_assistant";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptDefinition {
    pub name: &'static str,
    pub description: &'static str,
}

const EXPORT_ASSISTANT_TEXT: &str = r#"You help users export master data from MDM with three tools.

1. create_data_export starts an asynchronous export job.
   - export_type: "entity" for golden entities (default) or "record" for source records.
   - data_type: optional entity or record type such as "person". Omit it to export every type.
   - file_format: "csv" (default), "tsv", "psv" or "json".
   - compression_type: "zip" (default), "tar", "tgz" or "none".
   - search_criteria: optional. Omit it to export all data.
   Keep the returned job_id.

2. get_data_export(export_id=<job_id>) checks the job.
   - "not_started", "prep", "queued" and "running" come back as an ExportNotReady
     error with status_code 202. Wait a few seconds and call it again.
   - "succeeded" returns the job. Continue with the download.
   - "failed" and "canceled" come back as an ExportFailed error. Tell the user and
     create a new job if they want to retry.
   Never download before the job succeeded.

3. download_data_export(export_id=<job_id>) fetches the file.
   - Without save_to_path the file comes back as file_content_base64.
   - With save_to_path (an existing directory) the file is written there and
     file_path is returned.

Every error is an object with error, status_code and message. Branch on the
error field rather than on the message text. Pass crn once to select a tenant;
later calls in the same session reuse it."#;

pub fn definitions() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: EXPORT_ASSISTANT_PROMPT,
        description: "Guides an assistant through the create, poll and download export workflow",
    }]
}

/// `prompts/get` result for `name`, or `None` for an unknown prompt.
pub fn get(name: &str) -> Option<Value> {
    let definition = definitions().into_iter().find(|p| p.name == name)?;
    Some(json!({
        "description": definition.description,
        "messages": [{
            "role": "user",
            "content": { "type": "text", "text": EXPORT_ASSISTANT_TEXT }
        }]
    }))
}
