//! Shared utilities and common types for the MDM MCP server.
//!
//! This crate provides common functionality used across all other crates:
//! - Tenant CRN parsing and validation
//! - Transport-safe payload encoding
//! - Common validation logic

pub mod crn;
pub mod encoding;
pub mod validation;

pub use crn::{CrnError, TenantCrn};
