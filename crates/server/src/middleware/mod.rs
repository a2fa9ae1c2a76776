//! HTTP middleware components.

pub mod logging;
pub mod trace_id;

pub use logging::init_logging;
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
