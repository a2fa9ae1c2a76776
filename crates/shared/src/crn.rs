//! Cloud Resource Name (CRN) handling for tenant scoping.
//!
//! Every call against the MDM API carries a CRN that selects the tenant.
//! The expected shape is:
//!
//! ```text
//! crn:v1:<cname>:<ctype>:<service>:<region>:<scope>:<instance>:<resource-type>:<resource>
//! ```
//!
//! Only the prefix and the instance segment are checked; the rest is opaque.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of colon-separated segments (up to and including the instance).
const MIN_SEGMENTS: usize = 8;

/// Index of the service instance segment, which identifies the tenant.
const INSTANCE_SEGMENT: usize = 7;

/// Errors produced while parsing a CRN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrnError {
    #[error("CRN must not be empty")]
    Empty,

    #[error("CRN must start with 'crn:' but got '{0}'")]
    MissingPrefix(String),

    #[error("CRN '{0}' has too few segments (expected at least {MIN_SEGMENTS})")]
    TooFewSegments(String),

    #[error("CRN '{0}' has an empty service instance segment")]
    MissingInstance(String),
}

/// A validated tenant CRN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantCrn {
    raw: String,
    tenant_id: String,
}

impl TenantCrn {
    /// Parse and validate a CRN string. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, CrnError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(CrnError::Empty);
        }

        let segments: Vec<&str> = raw.split(':').collect();
        if !segments[0].eq_ignore_ascii_case("crn") {
            return Err(CrnError::MissingPrefix(raw.to_string()));
        }
        if segments.len() < MIN_SEGMENTS {
            return Err(CrnError::TooFewSegments(raw.to_string()));
        }

        let instance = segments[INSTANCE_SEGMENT].trim();
        if instance.is_empty() {
            return Err(CrnError::MissingInstance(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            tenant_id: instance.to_string(),
        })
    }

    /// The full CRN as sent to the API.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The tenant identifier (service instance segment).
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

impl fmt::Display for TenantCrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for TenantCrn {
    type Err = CrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TenantCrn {
    type Error = CrnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantCrn> for String {
    fn from(crn: TenantCrn) -> Self {
        crn.raw
    }
}
