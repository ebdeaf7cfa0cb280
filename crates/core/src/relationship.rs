//! Cross-attribute constraints.
//!
//! A relationship ties one source attribute to an ordered list of targets
//! and holds rules evaluated over the full record. All rules must pass; they
//! run in registration order and evaluation stops at the first failure.

use crate::attribute::Attribute;
use crate::rules::RelationshipRule;
use crate::value::{AttributeValue, Record};

#[derive(Debug, Clone)]
pub struct AttributeRelationship {
    kind: String,
    source: Attribute,
    targets: Vec<Attribute>,
    rules: Vec<RelationshipRule>,
}

impl AttributeRelationship {
    /// `kind` is a free-form label such as `"one-to-one"` or `"excludes"`.
    pub fn new(kind: impl Into<String>, source: Attribute) -> Self {
        Self {
            kind: kind.into(),
            source,
            targets: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: Attribute) -> Self {
        self.add_target(target);
        self
    }

    pub fn add_target(&mut self, target: Attribute) {
        self.targets.push(target);
    }

    pub fn with_rule(mut self, rule: RelationshipRule) -> Self {
        self.add_rule(rule);
        self
    }

    pub fn add_rule(&mut self, rule: RelationshipRule) {
        self.rules.push(rule);
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn source(&self) -> &Attribute {
        &self.source
    }

    pub fn targets(&self) -> &[Attribute] {
        &self.targets
    }

    pub fn rules(&self) -> &[RelationshipRule] {
        &self.rules
    }

    /// The source attribute's value in `record`, if present.
    pub fn source_value<'r>(&self, record: &'r Record) -> Option<&'r AttributeValue> {
        record.get(self.source.name())
    }

    /// Each target's value in `record`, in target order.
    pub fn target_values<'r>(&self, record: &'r Record) -> Vec<Option<&'r AttributeValue>> {
        self.targets.iter().map(|t| record.get(t.name())).collect()
    }

    pub fn validate(&self, record: &Record) -> bool {
        self.first_failing_rule(record).is_none()
    }

    /// Index of the first rule that rejects `record`.
    pub fn first_failing_rule(&self, record: &Record) -> Option<usize> {
        self.rules
            .iter()
            .position(|rule| !rule.evaluate(&self.source, &self.targets, record))
    }

    /// Indices of every rule that rejects `record`. Unlike
    /// [`first_failing_rule`](Self::first_failing_rule), all rules run.
    pub fn failing_rules<'a>(&'a self, record: &'a Record) -> impl Iterator<Item = usize> + 'a {
        self.rules
            .iter()
            .enumerate()
            .filter(move |(_, rule)| !rule.evaluate(&self.source, &self.targets, record))
            .map(|(i, _)| i)
    }
}
