//! Domain services for the MDM export workflow.
//!
//! Services hold the workflow rules; the remote calls sit behind
//! [`ExportGateway`] so they can be swapped for a mock in tests.

pub mod export_gateway;
pub mod export_request;
pub mod job_status;

pub use export_gateway::{
    DownloadTarget, DownloadedContent, DownloadedExport, ExportGateway, MockExportGateway,
};
pub use export_request::{
    build_export_request, default_search_criteria, normalize_export_kind, CreateExportRequest,
    ExportRequestBody, ExportRequestInput,
};
pub use job_status::{interpret, StatusVerdict};
