//! Domain layer for the MDM MCP server.
//!
//! This crate contains:
//! - Export job and search criteria models
//! - The export request builder and job status interpreter
//! - The `ExportGateway` port and its error type

pub mod error;
pub mod models;
pub mod services;

pub use error::GatewayError;
