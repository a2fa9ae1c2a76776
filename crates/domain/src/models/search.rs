//! Search criteria used to select the data an export job extracts.
//!
//! The query is a recursive expression tree: leaves compare one property,
//! compound nodes combine children with `and`/`or`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::export::ExportKind;

/// Wildcard used for "every property" and "any value".
pub const WILDCARD: &str = "*";

/// Comparison applied by a leaf expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Equal,
    NotEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Fuzzy,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    HasValue,
    HasNoValue,
}

impl Condition {
    /// Presence checks are the only conditions that take no value.
    pub fn is_presence_check(&self) -> bool {
        matches!(self, Condition::HasValue | Condition::HasNoValue)
    }
}

/// Boolean combinator of a compound expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    And,
    Or,
}

/// A single comparison, e.g. `legal_name.last_name equal "Smith"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafExpression {
    /// Dot-separated property path, or `*` for every property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl LeafExpression {
    /// The bare `{"value": "*"}` form, which needs no property or condition.
    pub fn is_wildcard(&self) -> bool {
        self.property.is_none()
            && self.condition.is_none()
            && self.value.as_ref().and_then(Value::as_str) == Some(WILDCARD)
    }
}

/// An ordered, non-empty list of child expressions joined by one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundExpression {
    #[serde(default)]
    pub operation: Operation,
    pub expressions: Vec<QueryExpression>,
}

/// Node of the query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryExpression {
    Compound(CompoundExpression),
    Leaf(LeafExpression),
}

impl QueryExpression {
    pub fn leaf(property: impl Into<String>, condition: Condition, value: Option<Value>) -> Self {
        QueryExpression::Leaf(LeafExpression {
            property: Some(property.into()),
            condition: Some(condition),
            value,
        })
    }

    /// Full-text match on everything: `{"value": "*"}`.
    pub fn wildcard() -> Self {
        QueryExpression::Leaf(LeafExpression {
            property: None,
            condition: None,
            value: Some(Value::String(WILDCARD.to_string())),
        })
    }

    pub fn and(expressions: Vec<QueryExpression>) -> Self {
        QueryExpression::Compound(CompoundExpression {
            operation: Operation::And,
            expressions,
        })
    }

    pub fn or(expressions: Vec<QueryExpression>) -> Self {
        QueryExpression::Compound(CompoundExpression {
            operation: Operation::Or,
            expressions,
        })
    }

    fn validate_at(&self, path: &str) -> Result<(), SearchCriteriaError> {
        match self {
            QueryExpression::Compound(compound) => {
                if compound.expressions.is_empty() {
                    return Err(SearchCriteriaError::EmptyCompound(path.to_string()));
                }
                compound
                    .expressions
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, child)| {
                        child.validate_at(&format!("{}.expressions[{}]", path, i))
                    })
            }
            QueryExpression::Leaf(leaf) if leaf.is_wildcard() => Ok(()),
            QueryExpression::Leaf(leaf) => {
                let condition = leaf
                    .condition
                    .ok_or_else(|| SearchCriteriaError::MissingCondition(path.to_string()))?;
                let has_value = leaf.value.as_ref().is_some_and(|v| !v.is_null());
                if !condition.is_presence_check() && !has_value {
                    return Err(SearchCriteriaError::MissingValue(path.to_string()));
                }
                Ok(())
            }
        }
    }
}

/// Restricts a search to one data type, e.g. `{"type": "entity", "values": ["person"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(rename = "type")]
    pub filter_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl SearchFilter {
    /// Filter selecting all data of the given export kind, optionally one type.
    pub fn for_kind(kind: ExportKind, data_type: Option<&str>) -> Self {
        Self {
            filter_type: kind.to_string(),
            values: data_type
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| vec![t.to_string()])
                .unwrap_or_default(),
        }
    }
}

/// The filter tree sent as `search_criteria` in an export job body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_type: Option<ExportKind>,
    pub query: QueryExpression,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<SearchFilter>,
}

impl SearchCriteria {
    /// Check the tree invariants: compounds have children, leaves other than
    /// the bare wildcard have a condition, and non-presence conditions carry
    /// a value.
    pub fn validate(&self) -> Result<(), SearchCriteriaError> {
        self.query.validate_at("query")?;
        if let Some(index) = self
            .filters
            .iter()
            .position(|f| f.filter_type.trim().is_empty())
        {
            return Err(SearchCriteriaError::EmptyFilterType(index));
        }
        Ok(())
    }
}

/// Violations of the search criteria invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchCriteriaError {
    #[error("{0}: compound expression must contain at least one expression")]
    EmptyCompound(String),

    #[error("{0}: expression must have a condition")]
    MissingCondition(String),

    #[error("{0}: expression condition requires a value")]
    MissingValue(String),

    #[error("filters[{0}]: filter type must not be empty")]
    EmptyFilterType(usize),

    #[error("search_criteria is malformed: {0}")]
    Malformed(String),
}
