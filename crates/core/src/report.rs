//! Diagnostic validation results.

use serde::{Deserialize, Serialize};

use crate::value::AttributeValue;

/// Which stage of validation produced a violation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSource {
    Attribute,
    Relationship,
}

/// Aggregated result of validating one record against a manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<FieldViolation>,
}

impl ValidationReport {
    pub(crate) fn from_violations(violations: Vec<FieldViolation>) -> Self {
        Self {
            is_valid: violations.is_empty(),
            violations,
        }
    }

    /// Violations raised by a given attribute or relationship source.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldViolation> {
        self.violations.iter().filter(move |v| v.field == field)
    }
}

/// A single failed attribute or relationship rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Attribute name, or the relationship's source attribute name.
    pub field: String,
    pub source: ViolationSource,
    /// Attribute type, or the relationship kind label.
    pub check: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AttributeValue>,
}
