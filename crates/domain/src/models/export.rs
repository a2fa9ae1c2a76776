//! Export job domain models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What an export job extracts: golden entities or source records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    #[default]
    Entity,
    Record,
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Entity => write!(f, "entity"),
            ExportKind::Record => write!(f, "record"),
        }
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entity" => Ok(ExportKind::Entity),
            "record" => Ok(ExportKind::Record),
            _ => Err(format!("Unknown export type: {}", s)),
        }
    }
}

/// File format of the generated export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Csv,
    Tsv,
    Psv,
    Json,
}

impl FileFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Tsv => "tsv",
            FileFormat::Psv => "psv",
            FileFormat::Json => "json",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "tsv" => Ok(FileFormat::Tsv),
            "psv" => Ok(FileFormat::Psv),
            "json" => Ok(FileFormat::Json),
            _ => Err(format!(
                "Unknown file format: {} (expected csv, tsv, psv or json)",
                s
            )),
        }
    }
}

/// Transport-level compression of the export file.
///
/// Travels as the `compression_type` query parameter, never in the job body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    #[default]
    Zip,
    Tar,
    Tgz,
}

impl Compression {
    /// Value of the `compression_type` query parameter, `None` when uncompressed.
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Zip => Some("zip"),
            Compression::Tar => Some("tar"),
            Compression::Tgz => Some("tgz"),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value().unwrap_or("none"))
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Compression::None),
            "zip" => Ok(Compression::Zip),
            "tar" => Ok(Compression::Tar),
            "tgz" => Ok(Compression::Tgz),
            _ => Err(format!(
                "Unknown compression type: {} (expected zip, tar, tgz or none)",
                s
            )),
        }
    }
}

/// Lifecycle phase of a remote export job.
///
/// `not_started -> prep -> queued -> running -> {succeeded | failed | canceled}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    NotStarted,
    Prep,
    Queued,
    Running,
    Succeeded,
    Failed,
    Canceled,
    /// A status string this client does not know.
    #[default]
    Unknown,
}

/// Client-actionable class of a lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseClass {
    /// Still in progress; poll again later.
    Running,
    /// Finished successfully; the file can be downloaded.
    Succeeded,
    /// Finished unsuccessfully; a new job must be created.
    Failed,
}

impl JobPhase {
    /// Classify a raw status string. Unrecognized values map to `Unknown`.
    pub fn parse(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "not_started" => JobPhase::NotStarted,
            "prep" => JobPhase::Prep,
            "queued" => JobPhase::Queued,
            "running" => JobPhase::Running,
            "succeeded" => JobPhase::Succeeded,
            "failed" => JobPhase::Failed,
            "canceled" | "cancelled" => JobPhase::Canceled,
            _ => JobPhase::Unknown,
        }
    }

    /// Unknown phases are treated as still running so the caller keeps polling.
    pub fn class(&self) -> PhaseClass {
        match self {
            JobPhase::Succeeded => PhaseClass::Succeeded,
            JobPhase::Failed | JobPhase::Canceled => PhaseClass::Failed,
            JobPhase::NotStarted
            | JobPhase::Prep
            | JobPhase::Queued
            | JobPhase::Running
            | JobPhase::Unknown => PhaseClass::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.class() != PhaseClass::Running
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobPhase::NotStarted => write!(f, "not_started"),
            JobPhase::Prep => write!(f, "prep"),
            JobPhase::Queued => write!(f, "queued"),
            JobPhase::Running => write!(f, "running"),
            JobPhase::Succeeded => write!(f, "succeeded"),
            JobPhase::Failed => write!(f, "failed"),
            JobPhase::Canceled => write!(f, "canceled"),
            JobPhase::Unknown => write!(f, "unknown"),
        }
    }
}

/// Job identifiers arrive as strings, but some deployments send bare numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Job descriptor exactly as the remote system sends it.
#[derive(Debug, Clone, Deserialize)]
struct RawExportJob {
    job_id: Option<RawId>,
    id: Option<RawId>,
    job_name: Option<String>,
    job_type: Option<String>,
    status: Option<String>,
    export_type: Option<String>,
    file_name: Option<String>,
    file_expired: Option<bool>,
    start_time: Option<String>,
    end_time: Option<String>,
    process_ids: Option<Vec<serde_json::Value>>,
    search_criteria: Option<serde_json::Value>,
    additional_info: Option<serde_json::Value>,
    record_count: Option<i64>,
}

/// The remote system's record of one export task.
///
/// Remote-owned: the client only observes it through create and poll calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExportJob")]
pub struct ExportJob {
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    /// Status string as reported, kept verbatim for messages.
    pub status: String,
    #[serde(skip)]
    pub phase: JobPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_type: Option<ExportKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_expired: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub process_ids: Vec<String>,
    /// Criteria echoed back by the remote system; opaque to the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_criteria: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<i64>,
}

impl TryFrom<RawExportJob> for ExportJob {
    type Error = String;

    fn try_from(raw: RawExportJob) -> Result<Self, Self::Error> {
        let job_id = raw
            .job_id
            .or(raw.id)
            .map(RawId::into_string)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| "export job descriptor has neither job_id nor id".to_string())?;

        let status = raw.status.unwrap_or_else(|| "unknown".to_string());
        let phase = JobPhase::parse(&status);

        // end_time only exists once the job reached a terminal phase.
        let end_time = if phase.is_terminal() {
            raw.end_time
        } else {
            None
        };

        let export_type = raw
            .export_type
            .as_deref()
            .and_then(|value| value.parse::<ExportKind>().ok());

        let process_ids = raw
            .process_ids
            .unwrap_or_default()
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();

        Ok(ExportJob {
            job_id,
            job_name: raw.job_name,
            job_type: raw.job_type,
            status,
            phase,
            export_type,
            file_name: raw.file_name,
            file_expired: raw.file_expired,
            start_time: raw.start_time,
            end_time,
            process_ids,
            search_criteria: raw.search_criteria,
            additional_info: raw.additional_info,
            record_count: raw.record_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_export_kind_from_str() {
        assert_eq!(ExportKind::from_str("entity").unwrap(), ExportKind::Entity);
        assert_eq!(ExportKind::from_str(" RECORD ").unwrap(), ExportKind::Record);
        assert!(ExportKind::from_str("relationship").is_err());
    }

    #[test]
    fn test_file_format_from_str() {
        assert_eq!(FileFormat::from_str("TSV").unwrap(), FileFormat::Tsv);
        assert_eq!(FileFormat::from_str("json").unwrap(), FileFormat::Json);
        assert!(FileFormat::from_str("xml").is_err());
        assert_eq!(FileFormat::default(), FileFormat::Csv);
    }

    #[test]
    fn test_compression_query_value() {
        assert_eq!(Compression::Zip.query_value(), Some("zip"));
        assert_eq!(Compression::Tgz.query_value(), Some("tgz"));
        assert_eq!(Compression::None.query_value(), None);
        assert_eq!(Compression::None.to_string(), "none");
        assert_eq!(Compression::default(), Compression::Zip);
    }

    #[test]
    fn test_compression_from_str() {
        assert_eq!(Compression::from_str("none").unwrap(), Compression::None);
        assert_eq!(Compression::from_str("Tar").unwrap(), Compression::Tar);
        assert!(Compression::from_str("gzip").is_err());
    }

    #[test]
    fn test_job_phase_classification() {
        for status in ["not_started", "prep", "queued", "running"] {
            assert_eq!(JobPhase::parse(status).class(), PhaseClass::Running, "{status}");
        }
        assert_eq!(JobPhase::parse("succeeded").class(), PhaseClass::Succeeded);
        assert_eq!(JobPhase::parse("failed").class(), PhaseClass::Failed);
        assert_eq!(JobPhase::parse("canceled").class(), PhaseClass::Failed);
    }

    #[test]
    fn test_job_phase_unknown_keeps_polling() {
        let phase = JobPhase::parse("archived");
        assert_eq!(phase, JobPhase::Unknown);
        assert_eq!(phase.class(), PhaseClass::Running);
        assert!(!phase.is_terminal());
    }

    #[test]
    fn test_job_phase_display_round_trip() {
        for phase in [
            JobPhase::NotStarted,
            JobPhase::Prep,
            JobPhase::Queued,
            JobPhase::Running,
            JobPhase::Succeeded,
            JobPhase::Failed,
            JobPhase::Canceled,
        ] {
            assert_eq!(JobPhase::parse(&phase.to_string()), phase);
        }
    }

    #[test]
    fn test_export_job_deserialize_full() {
        let job: ExportJob = serde_json::from_value(json!({
            "job_id": "23863905037872091",
            "job_type": "export",
            "status": "succeeded",
            "export_type": "entity",
            "file_name": "export_23863905037872091.zip",
            "file_expired": false,
            "start_time": "2025-01-10T10:00:00Z",
            "end_time": "2025-01-10T10:05:00Z",
            "process_ids": ["p-1", 42],
            "search_criteria": {"search_type": "entity"}
        }))
        .unwrap();

        assert_eq!(job.job_id, "23863905037872091");
        assert_eq!(job.phase, JobPhase::Succeeded);
        assert_eq!(job.export_type, Some(ExportKind::Entity));
        assert_eq!(job.end_time.as_deref(), Some("2025-01-10T10:05:00Z"));
        assert_eq!(job.process_ids, vec!["p-1".to_string(), "42".to_string()]);
    }

    #[test]
    fn test_export_job_accepts_id_alias_and_numbers() {
        let job: ExportJob =
            serde_json::from_value(json!({"id": 23863905037872091u64, "status": "queued"}))
                .unwrap();
        assert_eq!(job.job_id, "23863905037872091");
        assert_eq!(job.phase, JobPhase::Queued);
    }

    #[test]
    fn test_export_job_prefers_job_id_over_id() {
        let job: ExportJob =
            serde_json::from_value(json!({"job_id": "a", "id": "b", "status": "running"}))
                .unwrap();
        assert_eq!(job.job_id, "a");
    }

    #[test]
    fn test_export_job_requires_an_id() {
        let result: Result<ExportJob, _> = serde_json::from_value(json!({"status": "running"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_export_job_drops_end_time_while_running() {
        let job: ExportJob = serde_json::from_value(json!({
            "job_id": "1",
            "status": "running",
            "end_time": "2025-01-10T10:05:00Z"
        }))
        .unwrap();
        assert!(job.end_time.is_none());
    }

    #[test]
    fn test_export_job_missing_status_is_unknown() {
        let job: ExportJob = serde_json::from_value(json!({"job_id": "1"})).unwrap();
        assert_eq!(job.status, "unknown");
        assert_eq!(job.phase, JobPhase::Unknown);
    }

    #[test]
    fn test_export_job_serialize_skips_empty_fields() {
        let job: ExportJob =
            serde_json::from_value(json!({"job_id": "1", "status": "queued"})).unwrap();
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value, json!({"job_id": "1", "status": "queued"}));
    }
}
