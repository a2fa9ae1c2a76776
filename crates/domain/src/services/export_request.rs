//! Export request builder.
//!
//! Turns the caller-facing create parameters into the body and query
//! parameters of `POST data_exports`. Pure data transformation, no I/O.

use serde::Serialize;

use crate::models::{
    Compression, ExportKind, FileFormat, QueryExpression, SearchCriteria, SearchCriteriaError,
    SearchFilter,
};

/// Caller-facing parameters of a create call, already parsed where the
/// value sets are closed.
#[derive(Debug, Clone, Default)]
pub struct ExportRequestInput {
    /// Raw export kind; normalized leniently, see [`normalize_export_kind`].
    pub export_type: Option<String>,
    /// Entity or record type narrowing the default criteria, e.g. `person`.
    pub data_type: Option<String>,
    pub file_format: FileFormat,
    pub compression: Compression,
    pub search_criteria: Option<SearchCriteria>,
    pub file_name: Option<String>,
    pub include_only_updated_after: Option<String>,
}

/// JSON body of the create call. Compression is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRequestBody {
    pub export_type: ExportKind,
    pub format: FileFormat,
    pub search_criteria: SearchCriteria,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_only_updated_after: Option<String>,
}

/// A fully built create call: body plus the compression query parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateExportRequest {
    pub body: ExportRequestBody,
    pub compression: Compression,
}

impl CreateExportRequest {
    /// Query parameters for the create call, excluding the tenant `crn`
    /// which the transport attaches to every call.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        self.compression
            .query_value()
            .map(|value| vec![("compression_type", value.to_string())])
            .unwrap_or_default()
    }
}

/// Lower-case and trim the export kind; blank or unknown values fall back
/// to `entity` with a warning instead of failing the call.
pub fn normalize_export_kind(raw: Option<&str>) -> ExportKind {
    let Some(raw) = raw else {
        return ExportKind::default();
    };

    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        tracing::warn!("Blank export_type, defaulting to entity");
        return ExportKind::default();
    }

    match normalized.parse::<ExportKind>() {
        Ok(kind) => kind,
        Err(_) => {
            tracing::warn!(export_type = %raw, "Unrecognized export_type, defaulting to entity");
            ExportKind::default()
        }
    }
}

/// Full-corpus criteria: one wildcard expression under `and`, filtered to
/// the requested kind (and data type, when given).
pub fn default_search_criteria(kind: ExportKind, data_type: Option<&str>) -> SearchCriteria {
    SearchCriteria {
        search_type: Some(kind),
        query: QueryExpression::and(vec![QueryExpression::wildcard()]),
        filters: vec![SearchFilter::for_kind(kind, data_type)],
    }
}

/// Build the create call from caller input.
///
/// Caller-supplied criteria are checked against the expression tree
/// invariants; the default criteria always satisfy them.
pub fn build_export_request(
    input: &ExportRequestInput,
) -> Result<CreateExportRequest, SearchCriteriaError> {
    let kind = normalize_export_kind(input.export_type.as_deref());

    let search_criteria = match &input.search_criteria {
        Some(criteria) => {
            criteria.validate()?;
            criteria.clone()
        }
        None => default_search_criteria(kind, input.data_type.as_deref()),
    };

    let body = ExportRequestBody {
        export_type: kind,
        format: input.file_format,
        search_criteria,
        file_name: non_blank(input.file_name.as_deref()),
        include_only_updated_after: non_blank(input.include_only_updated_after.as_deref()),
    };

    Ok(CreateExportRequest {
        body,
        compression: input.compression,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
