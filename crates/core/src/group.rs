//! Named groupings of attributes validated together.
//!
//! Attribute sets and profiles have identical behavior; the manager keeps
//! them in separate registries so the same name can exist in both.

use std::collections::HashMap;

use crate::attribute::Attribute;
use crate::config::{self, EngineConfig};
use crate::value::Record;

#[derive(Debug, Clone)]
pub struct AttributeGroup {
    name: String,
    members: Vec<Attribute>,
    index: HashMap<String, usize>,
}

pub type AttributeSet = AttributeGroup;
pub type AttributeProfile = AttributeGroup;

impl AttributeGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    /// Add or replace a member. A replaced member keeps its position.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        match self.index.get(attribute.name()) {
            Some(&i) => self.members[i] = attribute,
            None => {
                self.index
                    .insert(attribute.name().to_string(), self.members.len());
                self.members.push(attribute);
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.index.get(name).map(|&i| &self.members[i])
    }

    /// Members in insertion order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Every member present in `record` must accept its value. Members
    /// missing from the record are skipped; no relationship checks run here.
    pub fn validate(&self, record: &Record) -> bool {
        self.validate_with_config(record, config::defaults())
    }

    pub fn validate_with_config(&self, record: &Record, config: &EngineConfig) -> bool {
        self.members.iter().all(|attribute| match record.get(attribute.name()) {
            Some(value) if !value.is_null() => attribute.validate_with_config(value, config),
            _ => true,
        })
    }
}
