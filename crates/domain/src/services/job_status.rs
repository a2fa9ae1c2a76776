//! Job status interpreter.
//!
//! Decides what a status poll means for the caller. The remote system owns
//! every transition; this module only classifies what it reports.

use crate::models::{ExportJob, PhaseClass};

/// Outcome of a status poll.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusVerdict {
    /// The job succeeded and its file can be downloaded.
    Ready(ExportJob),
    /// The job is still in progress; poll again later.
    NotReady {
        export_id: String,
        status: String,
        job_id: String,
    },
    /// The job failed or was canceled; a new job must be created.
    Failed {
        export_id: String,
        status: String,
        job_id: String,
    },
}

impl StatusVerdict {
    /// Human-readable description of a non-ready verdict.
    pub fn message(&self) -> Option<String> {
        match self {
            StatusVerdict::Ready(_) => None,
            StatusVerdict::NotReady {
                export_id, status, ..
            } => Some(format!(
                "Export job {} is not ready. Status: {}. Please wait and retry.",
                export_id, status
            )),
            StatusVerdict::Failed {
                export_id, status, ..
            } => Some(format!("Export job {} {}.", export_id, status)),
        }
    }
}

/// Classify the job returned for `export_id`.
///
/// Unrecognized statuses count as still running.
pub fn interpret(export_id: &str, job: ExportJob) -> StatusVerdict {
    match job.phase.class() {
        PhaseClass::Succeeded => StatusVerdict::Ready(job),
        PhaseClass::Failed => StatusVerdict::Failed {
            export_id: export_id.to_string(),
            status: job.status,
            job_id: job.job_id,
        },
        PhaseClass::Running => {
            tracing::debug!(export_id = %export_id, status = %job.status, "Export not ready");
            StatusVerdict::NotReady {
                export_id: export_id.to_string(),
                status: job.status,
                job_id: job.job_id,
            }
        }
    }
}
