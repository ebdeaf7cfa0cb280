//! Attribute change history.
//!
//! The manager reports every value update to a [`ChangeSink`]. Sinks that
//! can answer queries also implement [`HistoryQuery`]. [`AttributeHistory`]
//! is the in-memory default; [`crate::audit::AuditLog`] is a tamper-evident
//! alternative and [`Tee`] feeds two sinks at once.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;
use crate::value::AttributeValue;

/// One value assignment on one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub attribute: String,
    /// `None` when the attribute had no value before the update.
    pub old_value: Option<AttributeValue>,
    pub new_value: AttributeValue,
    pub changed_by: String,
    pub changed_at: Timestamp,
}

/// Receives change events from the manager.
pub trait ChangeSink {
    fn log_change(&mut self, change: ChangeRecord);
}

/// Read-only access to recorded changes, in insertion order.
pub trait HistoryQuery {
    /// Changes to a single attribute.
    fn history(&self, attribute: &str) -> Vec<&ChangeRecord>;

    /// Every recorded change.
    fn full_history(&self) -> Vec<&ChangeRecord>;
}

impl<T: ChangeSink + ?Sized> ChangeSink for Box<T> {
    fn log_change(&mut self, change: ChangeRecord) {
        (**self).log_change(change);
    }
}

// ---------------------------------------------------------------------------
// AttributeHistory
// ---------------------------------------------------------------------------

/// Append-only, in-memory change log.
#[derive(Debug, Clone, Default)]
pub struct AttributeHistory {
    changes: Vec<ChangeRecord>,
}

impl AttributeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl ChangeSink for AttributeHistory {
    fn log_change(&mut self, change: ChangeRecord) {
        self.changes.push(change);
    }
}

impl HistoryQuery for AttributeHistory {
    fn history(&self, attribute: &str) -> Vec<&ChangeRecord> {
        self.changes
            .iter()
            .filter(|c| c.attribute == attribute)
            .collect()
    }

    fn full_history(&self) -> Vec<&ChangeRecord> {
        self.changes.iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Tee
// ---------------------------------------------------------------------------

/// Forwards every change to two sinks. Queries are answered by the first.
#[derive(Debug, Clone, Default)]
pub struct Tee<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A, B> Tee<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: ChangeSink, B: ChangeSink> ChangeSink for Tee<A, B> {
    fn log_change(&mut self, change: ChangeRecord) {
        self.secondary.log_change(change.clone());
        self.primary.log_change(change);
    }
}

impl<A: HistoryQuery, B> HistoryQuery for Tee<A, B> {
    fn history(&self, attribute: &str) -> Vec<&ChangeRecord> {
        self.primary.history(attribute)
    }

    fn full_history(&self) -> Vec<&ChangeRecord> {
        self.primary.full_history()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn change(attribute: &str, new_value: f64) -> ChangeRecord {
        ChangeRecord {
            attribute: attribute.to_string(),
            old_value: None,
            new_value: AttributeValue::from(new_value),
            changed_by: "admin".to_string(),
            changed_at: Utc::now(),
        }
    }

    #[test]
    fn history_filters_by_attribute_in_order() {
        let mut history = AttributeHistory::new();
        history.log_change(change("price", 19.99));
        history.log_change(change("weight", 2.0));
        history.log_change(change("price", 24.99));

        let price = history.history("price");
        assert_eq!(price.len(), 2);
        assert_eq!(price[0].new_value, AttributeValue::from(19.99));
        assert_eq!(price[1].new_value, AttributeValue::from(24.99));
        assert_eq!(history.full_history().len(), 3);
        assert!(history.history("color").is_empty());
    }

    #[test]
    fn tee_feeds_both_sinks() {
        let mut tee = Tee::new(AttributeHistory::new(), AttributeHistory::new());
        tee.log_change(change("price", 1.0));
        assert_eq!(tee.primary.len(), 1);
        assert_eq!(tee.secondary.len(), 1);
        assert_eq!(tee.full_history().len(), 1);
    }

    #[test]
    fn boxed_sinks_forward() {
        let mut sink: Box<AttributeHistory> = Box::default();
        sink.log_change(change("price", 1.0));
        assert_eq!(sink.full_history().len(), 1);
    }

    #[test]
    fn change_record_serializes_with_null_old_value() {
        let json = serde_json::to_value(change("price", 19.99)).unwrap();
        assert_eq!(json["attribute"], "price");
        assert!(json["old_value"].is_null());
        assert_eq!(json["new_value"], 19.99);
    }
}
