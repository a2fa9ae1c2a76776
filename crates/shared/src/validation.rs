//! Common validation utilities.

use chrono::DateTime;
use validator::ValidationError;

use crate::crn::TenantCrn;

/// Maximum length accepted for a remote export job identifier.
const MAX_EXPORT_ID_LENGTH: usize = 128;

/// Validates an export job identifier before it is placed into a URL path.
///
/// The id is assigned by the remote system, so only shape is checked:
/// non-blank, bounded length, not a dot segment, and no characters that
/// would change the path.
pub fn validate_export_id(export_id: &str) -> Result<(), ValidationError> {
    let trimmed = export_id.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("export_id_blank");
        err.message = Some("export_id must not be empty".into());
        return Err(err);
    }

    // URL normalization would resolve these against the collection path.
    if trimmed == "." || trimmed == ".." {
        let mut err = ValidationError::new("export_id_dot_segment");
        err.message = Some("export_id must not be '.' or '..'".into());
        return Err(err);
    }

    if trimmed.len() > MAX_EXPORT_ID_LENGTH {
        let mut err = ValidationError::new("export_id_length");
        err.message = Some(
            format!(
                "export_id must be at most {} characters",
                MAX_EXPORT_ID_LENGTH
            )
            .into(),
        );
        return Err(err);
    }

    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%' | '\\'))
    {
        let mut err = ValidationError::new("export_id_chars");
        err.message = Some("export_id contains characters that are not allowed".into());
        return Err(err);
    }

    Ok(())
}

/// Validates an RFC 3339 timestamp such as `2024-01-01T00:00:00Z`.
pub fn validate_rfc3339(timestamp: &str) -> Result<(), ValidationError> {
    match DateTime::parse_from_rfc3339(timestamp.trim()) {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = ValidationError::new("timestamp_format");
            err.message = Some("Timestamp must be RFC 3339, e.g. 2024-01-01T00:00:00Z".into());
            Err(err)
        }
    }
}

/// Validates that a string is a well-formed tenant CRN.
pub fn validate_crn(crn: &str) -> Result<(), ValidationError> {
    match TenantCrn::parse(crn) {
        Ok(_) => Ok(()),
        Err(e) => {
            let mut err = ValidationError::new("crn_format");
            err.message = Some(e.to_string().into());
            Err(err)
        }
    }
}
