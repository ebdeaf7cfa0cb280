//! Dependent attributes: a select whose allowed options are chosen by the
//! value of a parent attribute in the same record.
//!
//! Models hierarchical menus such as `vehicle_type -> model`. A parent value
//! may unlock several alternative child option sets; the dependent value is
//! valid when it belongs to at least one of them.
//!
//! Resolution is closed-world: a parent value with no registered dependency
//! fails, as does a missing parent or a missing dependent value.

use std::collections::BTreeMap;

use crate::select::{SelectAttribute, SelectOptions};
use crate::value::{AttributeValue, Record};

/// Why a dependent attribute failed to resolve.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DependencyFailure {
    #[error("parent attribute '{parent}' has no value")]
    MissingParent { parent: String },

    #[error("no dependency defined for {parent} = {value}")]
    NoDependency { parent: String, value: AttributeValue },

    #[error("value is missing")]
    MissingValue,

    #[error("value is not allowed when {parent} = {parent_value}")]
    NotAllowed { parent: String, parent_value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentAttribute {
    options: SelectOptions,
    parent_attribute: String,
    dependencies: BTreeMap<String, Vec<SelectAttribute>>,
}

impl DependentAttribute {
    /// Create a dependent attribute driven by `parent_attribute`.
    pub fn new(parent_attribute: impl Into<String>) -> Self {
        Self {
            options: SelectOptions::default(),
            parent_attribute: parent_attribute.into(),
            dependencies: BTreeMap::new(),
        }
    }

    /// Own option list, used only when the attribute is validated without a
    /// record.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = SelectOptions::new(options);
        self
    }

    pub fn with_dependency(mut self, parent_value: impl Into<String>, child: SelectAttribute) -> Self {
        self.add_dependency(parent_value, child);
        self
    }

    /// Register `child` as an allowed option set for `parent_value`.
    ///
    /// Repeated calls for the same parent value accumulate alternatives.
    pub fn add_dependency(&mut self, parent_value: impl Into<String>, child: SelectAttribute) {
        self.dependencies
            .entry(parent_value.into())
            .or_default()
            .push(child);
    }

    pub fn parent_attribute(&self) -> &str {
        &self.parent_attribute
    }

    pub fn options(&self) -> &SelectOptions {
        &self.options
    }

    /// Parent values that have at least one dependency, in sorted order.
    pub fn dependency_keys(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    /// Child option sets registered for `parent_value`.
    pub fn children_for(&self, parent_value: &str) -> &[SelectAttribute] {
        self.dependencies
            .get(parent_value)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Validate the value stored under `own_name` in `record` given the
    /// parent's value.
    pub fn validate_with_dependencies(
        &self,
        own_name: &str,
        parent_value: Option<&AttributeValue>,
        record: &Record,
    ) -> bool {
        self.resolve(own_name, parent_value, record).is_ok()
    }

    /// Same as [`validate_with_dependencies`](Self::validate_with_dependencies)
    /// but reports why resolution failed.
    pub fn resolve(
        &self,
        own_name: &str,
        parent_value: Option<&AttributeValue>,
        record: &Record,
    ) -> Result<(), DependencyFailure> {
        let parent_value = match parent_value {
            Some(v) if !v.is_null() => v,
            _ => {
                return Err(DependencyFailure::MissingParent {
                    parent: self.parent_attribute.clone(),
                })
            }
        };

        // Only text parent values can key a dependency.
        let (key, children) = match parent_value
            .as_text()
            .and_then(|key| self.dependencies.get_key_value(key))
        {
            Some(found) => found,
            None => {
                return Err(DependencyFailure::NoDependency {
                    parent: self.parent_attribute.clone(),
                    value: parent_value.clone(),
                })
            }
        };

        let selected = record
            .get(own_name)
            .filter(|v| !v.is_null())
            .ok_or(DependencyFailure::MissingValue)?;

        if children.iter().any(|child| child.validate(selected)) {
            Ok(())
        } else {
            Err(DependencyFailure::NotAllowed {
                parent: self.parent_attribute.clone(),
                parent_value: key.clone(),
            })
        }
    }
}
