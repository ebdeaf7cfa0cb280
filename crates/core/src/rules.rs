//! Caller-supplied rule callbacks.
//!
//! Rules are opaque policy injected by the caller. They must be pure: the
//! engine may call them any number of times, in registration order, and
//! stops at the first rule that returns `false`.

use std::fmt;
use std::sync::Arc;

use crate::attribute::Attribute;
use crate::value::{AttributeValue, Record};

type ValueFn = dyn Fn(&AttributeValue) -> bool + Send + Sync;
type RelationshipFn = dyn Fn(&Attribute, &[Attribute], &Record) -> bool + Send + Sync;

// ---------------------------------------------------------------------------
// ValueRule
// ---------------------------------------------------------------------------

/// A predicate over a single value, attached to a custom attribute.
#[derive(Clone)]
pub struct ValueRule {
    label: Option<String>,
    check: Arc<ValueFn>,
}

impl ValueRule {
    pub fn new(check: impl Fn(&AttributeValue) -> bool + Send + Sync + 'static) -> Self {
        Self {
            label: None,
            check: Arc::new(check),
        }
    }

    /// Attach a human-readable label reported in validation diagnostics.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn evaluate(&self, value: &AttributeValue) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for ValueRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRule")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// RelationshipRule
// ---------------------------------------------------------------------------

/// A predicate over a relationship's source, its targets, and the full
/// record.
#[derive(Clone)]
pub struct RelationshipRule {
    label: Option<String>,
    check: Arc<RelationshipFn>,
}

impl RelationshipRule {
    pub fn new(
        check: impl Fn(&Attribute, &[Attribute], &Record) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: None,
            check: Arc::new(check),
        }
    }

    /// Attach a human-readable label reported in validation diagnostics.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn evaluate(&self, source: &Attribute, targets: &[Attribute], record: &Record) -> bool {
        (self.check)(source, targets, record)
    }
}

impl fmt::Debug for RelationshipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationshipRule")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_rule_evaluates_closure() {
        let rule = ValueRule::new(|v| v.as_text().is_some_and(|s| s.len() <= 5));
        assert!(rule.evaluate(&AttributeValue::from("short")));
        assert!(!rule.evaluate(&AttributeValue::from("too long")));
    }

    #[test]
    fn label_shows_in_debug_output() {
        let rule = ValueRule::new(|_| true).labeled("always");
        assert_eq!(rule.label(), Some("always"));
        assert!(format!("{rule:?}").contains("always"));
    }

    #[test]
    fn relationship_rule_sees_record() {
        let rule = RelationshipRule::new(|source, _targets, record| {
            record.get(source.name()) == Some(&AttributeValue::from("Red"))
        });
        let color = Attribute::text("color");
        let record = Record::new().with("color", "Red");
        assert!(rule.evaluate(&color, &[], &record));
        assert!(!rule.evaluate(&color, &[], &Record::new()));
    }
}
