//! HTTP client for the MDM data export API.
//!
//! This crate contains:
//! - `Transport`: authenticated, tenant-scoped calls with retry and body capture
//! - Download materialization to memory or disk
//! - `DataExportClient`, the reqwest-backed `ExportGateway`

pub mod config;
pub mod data_exports;
pub mod download;
pub mod transport;

pub use config::MdmClientConfig;
pub use data_exports::DataExportClient;
pub use transport::Transport;
