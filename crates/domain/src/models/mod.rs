//! Domain models for the MDM export workflow.

pub mod export;
pub mod search;

pub use export::{Compression, ExportJob, ExportKind, FileFormat, JobPhase, PhaseClass};
pub use search::{
    CompoundExpression, Condition, LeafExpression, Operation, QueryExpression, SearchCriteria,
    SearchCriteriaError, SearchFilter,
};
