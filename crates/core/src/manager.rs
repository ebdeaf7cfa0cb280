//! The attribute registry and validation orchestrator.
//!
//! [`AttributeManager`] owns the flat attribute registry, the set and
//! profile registries, and the relationship list. Validation borrows the
//! manager immutably and never mutates the record, so concurrent validations
//! only need shared access; [`AttributeManager::update_attribute`] needs
//! exclusive access. A concurrent host wraps the manager in a single
//! `RwLock`.
//!
//! Validation of a record runs in two phases:
//!
//! 1. every registered attribute, in registration order, resolved against
//!    the record (dependent attributes chase their parent's value);
//! 2. every relationship, in registration order.
//!
//! The first failure makes the whole record invalid.

use std::collections::HashMap;

use chrono::Utc;

use crate::attribute::Attribute;
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::group::{AttributeProfile, AttributeSet};
use crate::history::{AttributeHistory, ChangeRecord, ChangeSink, HistoryQuery};
use crate::relationship::AttributeRelationship;
use crate::report::{FieldViolation, ValidationReport, ViolationSource};
use crate::value::{AttributeValue, Record};

#[derive(Debug)]
pub struct AttributeManager<S = AttributeHistory> {
    config: EngineConfig,
    attributes: Vec<Attribute>,
    attribute_index: HashMap<String, usize>,
    sets: HashMap<String, AttributeSet>,
    profiles: HashMap<String, AttributeProfile>,
    relationships: Vec<AttributeRelationship>,
    sink: S,
}

impl AttributeManager<AttributeHistory> {
    /// A manager with default configuration and in-memory history.
    pub fn new() -> Self {
        Self::assemble(EngineConfig::default(), AttributeHistory::new())
    }

    /// A manager with in-memory history. Fails if `config` does not pass
    /// [`EngineConfig::validate`].
    pub fn with_config(config: EngineConfig) -> Result<Self, CoreError> {
        Self::with_sink(config, AttributeHistory::new())
    }
}

impl Default for AttributeManager<AttributeHistory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ChangeSink> AttributeManager<S> {
    /// A manager reporting value updates to `sink`. Fails if `config` does
    /// not pass [`EngineConfig::validate`].
    pub fn with_sink(config: EngineConfig, sink: S) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self::assemble(config, sink))
    }

    fn assemble(config: EngineConfig, sink: S) -> Self {
        Self {
            config,
            attributes: Vec::new(),
            attribute_index: HashMap::new(),
            sets: HashMap::new(),
            profiles: HashMap::new(),
            relationships: Vec::new(),
            sink,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register an attribute. A later attribute with the same name replaces
    /// the earlier one and takes over its position in validation order.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        match self.attribute_index.get(attribute.name()) {
            Some(&i) => {
                tracing::debug!(attribute = %attribute.name(), "Replacing attribute");
                self.attributes[i] = attribute;
            }
            None => {
                self.attribute_index
                    .insert(attribute.name().to_string(), self.attributes.len());
                self.attributes.push(attribute);
            }
        }
    }

    /// Register an attribute set. Last write wins on name collision.
    pub fn add_attribute_set(&mut self, set: AttributeSet) {
        if self.sets.contains_key(set.name()) {
            tracing::debug!(set = %set.name(), "Replacing attribute set");
        }
        self.sets.insert(set.name().to_string(), set);
    }

    /// Register a profile. Profile names are unique: a second profile with
    /// the same name is rejected and the registered one is kept.
    pub fn add_profile(&mut self, profile: AttributeProfile) -> Result<(), CoreError> {
        if self.profiles.contains_key(profile.name()) {
            tracing::warn!(profile = %profile.name(), "Duplicate profile registration rejected");
            return Err(CoreError::DuplicateProfile(profile.name().to_string()));
        }
        tracing::info!(
            profile = %profile.name(),
            attributes = profile.len(),
            "Profile registered"
        );
        self.profiles.insert(profile.name().to_string(), profile);
        Ok(())
    }

    pub fn add_relationship(&mut self, relationship: AttributeRelationship) {
        self.relationships.push(relationship);
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attribute_index.get(name).map(|&i| &self.attributes[i])
    }

    /// Registered attribute names in validation order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(Attribute::name)
    }

    pub fn attribute_set(&self, name: &str) -> Option<&AttributeSet> {
        self.sets.get(name)
    }

    pub fn profile(&self, name: &str) -> Option<&AttributeProfile> {
        self.profiles.get(name)
    }

    pub fn relationships(&self) -> &[AttributeRelationship] {
        &self.relationships
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Validate `record` against every attribute, then every relationship.
    ///
    /// Attributes absent from the record pass, except dependent attributes,
    /// which need both their parent's value and their own.
    pub fn validate_attributes(&self, record: &Record) -> bool {
        for attribute in &self.attributes {
            if let Err(reason) = attribute.check_in_record(record, &self.config) {
                tracing::debug!(
                    attribute = %attribute.name(),
                    %reason,
                    "Attribute validation failed"
                );
                return false;
            }
        }

        for relationship in &self.relationships {
            if let Some(rule) = relationship.first_failing_rule(record) {
                tracing::debug!(
                    relationship = %relationship.kind(),
                    source = %relationship.source().name(),
                    rule,
                    "Relationship rule failed"
                );
                return false;
            }
        }

        true
    }

    /// Like [`validate_attributes`](Self::validate_attributes) but collects
    /// every failing attribute and every failing relationship rule instead
    /// of stopping at the first.
    ///
    /// `is_valid` always equals the result of `validate_attributes` for the
    /// same record.
    pub fn validate_attributes_report(&self, record: &Record) -> ValidationReport {
        let mut violations = Vec::new();

        for attribute in &self.attributes {
            if let Err(reason) = attribute.check_in_record(record, &self.config) {
                violations.push(FieldViolation {
                    field: attribute.name().to_string(),
                    source: ViolationSource::Attribute,
                    check: attribute.attribute_type().to_string(),
                    message: reason.to_string(),
                    value: record.get(attribute.name()).cloned(),
                });
            }
        }

        for relationship in &self.relationships {
            for index in relationship.failing_rules(record) {
                let message = match relationship.rules()[index].label() {
                    Some(label) => format!("relationship rule '{label}' failed"),
                    None => format!("relationship rule #{} failed", index + 1),
                };
                violations.push(FieldViolation {
                    field: relationship.source().name().to_string(),
                    source: ViolationSource::Relationship,
                    check: relationship.kind().to_string(),
                    message,
                    value: relationship.source_value(record).cloned(),
                });
            }
        }

        ValidationReport::from_violations(violations)
    }

    /// Validate `record` against the named set. Unknown sets are invalid.
    pub fn validate_attribute_set(&self, set_name: &str, record: &Record) -> bool {
        match self.sets.get(set_name) {
            Some(set) => set.validate_with_config(record, &self.config),
            None => {
                tracing::debug!(set = %set_name, "Unknown attribute set");
                false
            }
        }
    }

    /// Validate `record` against the named profile. Unknown profiles are
    /// invalid.
    pub fn validate_profile(&self, profile_name: &str, record: &Record) -> bool {
        match self.profiles.get(profile_name) {
            Some(profile) => profile.validate_with_config(record, &self.config),
            None => {
                tracing::debug!(profile = %profile_name, "Unknown profile");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    /// Assign a new value to a registered attribute and report the change to
    /// the sink.
    ///
    /// The value is not validated. Returns `false`, without emitting a
    /// change, when no attribute has that name.
    pub fn update_attribute(
        &mut self,
        name: &str,
        new_value: impl Into<AttributeValue>,
        changed_by: &str,
    ) -> bool {
        let Some(&i) = self.attribute_index.get(name) else {
            tracing::debug!(attribute = %name, "Update of unknown attribute ignored");
            return false;
        };

        let new_value = new_value.into();
        let old_value = self.attributes[i].replace_value(new_value.clone());

        tracing::info!(attribute = %name, changed_by = %changed_by, "Attribute updated");
        self.sink.log_change(ChangeRecord {
            attribute: name.to_string(),
            old_value,
            new_value,
            changed_by: changed_by.to_string(),
            changed_at: Utc::now(),
        });
        true
    }
}

impl<S: ChangeSink + HistoryQuery> AttributeManager<S> {
    /// Changes to one attribute, oldest first.
    pub fn attribute_history(&self, name: &str) -> Vec<&ChangeRecord> {
        self.sink.history(name)
    }

    /// Every recorded change, oldest first.
    pub fn full_history(&self) -> Vec<&ChangeRecord> {
        self.sink.full_history()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependent::DependentAttribute;
    use crate::group::AttributeGroup;
    use crate::rules::RelationshipRule;
    use crate::select::SelectAttribute;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_json(value).expect("test records are objects")
    }

    fn vehicle_manager() -> AttributeManager {
        let mut manager = AttributeManager::new();
        manager.add_attribute(Attribute::select("vehicle_type", ["Car", "Motorcycle"]));
        manager.add_attribute(Attribute::dependent(
            "model",
            DependentAttribute::new("vehicle_type")
                .with_dependency("Car", SelectAttribute::new("model", ["Sedan", "SUV", "Coupe"]))
                .with_dependency("Motorcycle", SelectAttribute::new("model", ["Sport", "Cruiser"])),
        ));
        manager
    }

    fn color_size_manager() -> AttributeManager {
        let color = Attribute::select("color", ["Red", "Blue", "Green"]);
        let size = Attribute::select("size", ["Small", "Medium", "Large"]);
        let relationship = AttributeRelationship::new("one-to-one", color.clone())
            .with_target(size.clone())
            .with_rule(
                RelationshipRule::new(|source, targets, record| {
                    let red = record.get(source.name()) == Some(&AttributeValue::from("Red"));
                    !(red
                        && targets.iter().any(|t| {
                            record.get(t.name()) == Some(&AttributeValue::from("Small"))
                        }))
                })
                .labeled("red excludes small"),
            );

        let mut manager = AttributeManager::new();
        manager.add_attribute(color);
        manager.add_attribute(size);
        manager.add_relationship(relationship);
        manager
    }

    #[test]
    fn plain_attributes_validate_present_values() {
        let mut manager = AttributeManager::new();
        manager.add_attribute(Attribute::number("price"));
        assert!(manager.validate_attributes(&record(json!({"price": 19.99}))));
        assert!(!manager.validate_attributes(&record(json!({"price": "free"}))));
        assert!(manager.validate_attributes(&record(json!({}))));
    }

    #[test]
    fn dependent_attribute_uses_parent_branch() {
        let manager = vehicle_manager();
        assert!(manager.validate_attributes(&record(json!({"vehicle_type": "Car", "model": "SUV"}))));
        assert!(!manager.validate_attributes(&record(json!({"vehicle_type": "Car", "model": "Sport"}))));
        assert!(manager.validate_attributes(&record(
            json!({"vehicle_type": "Motorcycle", "model": "Sport"})
        )));
    }

    #[test]
    fn dependent_attribute_fails_without_parent() {
        let manager = vehicle_manager();
        assert!(!manager.validate_attributes(&record(json!({"model": "SUV"}))));
        assert!(!manager.validate_attributes(&record(json!({}))));
    }

    #[test]
    fn relationship_failure_invalidates_record() {
        let manager = color_size_manager();
        assert!(!manager.validate_attributes(&record(json!({"color": "Red", "size": "Small"}))));
        assert!(manager.validate_attributes(&record(json!({"color": "Red", "size": "Large"}))));
    }

    #[test]
    fn relationships_run_only_after_attributes_pass() {
        let manager = color_size_manager();
        // "Tiny" fails the size attribute before the relationship is reached.
        assert!(!manager.validate_attributes(&record(json!({"color": "Blue", "size": "Tiny"}))));
    }

    #[test]
    fn validation_is_repeatable() {
        let manager = color_size_manager();
        let r = record(json!({"color": "Red", "size": "Small"}));
        let first = manager.validate_attributes(&r);
        let second = manager.validate_attributes(&r);
        assert_eq!(first, second);
    }

    #[test]
    fn re_adding_an_attribute_replaces_it() {
        let mut manager = AttributeManager::new();
        manager.add_attribute(Attribute::text("code"));
        manager.add_attribute(Attribute::select("flag", ["on"]));
        manager.add_attribute(Attribute::number("code"));

        assert_eq!(manager.attribute_names().collect::<Vec<_>>(), ["code", "flag"]);
        assert!(!manager.validate_attributes(&record(json!({"code": "abc"}))));
        assert!(manager.validate_attributes(&record(json!({"code": "12"}))));
    }

    #[test]
    fn report_collects_every_violation() {
        let mut manager = color_size_manager();
        manager.add_attribute(Attribute::number("price"));
        let r = record(json!({"color": "Red", "size": "Small", "price": "free"}));

        let report = manager.validate_attributes_report(&r);
        assert!(!report.is_valid);
        assert_eq!(report.violations.len(), 2);

        let price = report.for_field("price").next().unwrap();
        assert_eq!(price.source, ViolationSource::Attribute);
        assert_eq!(price.check, "number");
        assert_eq!(price.value, Some(AttributeValue::from("free")));

        let rel = report.for_field("color").next().unwrap();
        assert_eq!(rel.source, ViolationSource::Relationship);
        assert_eq!(rel.check, "one-to-one");
        assert!(rel.message.contains("red excludes small"));
    }

    #[test]
    fn report_lists_each_failing_relationship_rule() {
        let mut manager = color_size_manager();
        manager.add_relationship(
            AttributeRelationship::new("excludes", Attribute::text("color"))
                .with_rule(RelationshipRule::new(|_, _, _| false).labeled("one"))
                .with_rule(RelationshipRule::new(|_, _, _| true).labeled("passes"))
                .with_rule(RelationshipRule::new(|_, _, _| false).labeled("two")),
        );
        let r = record(json!({"color": "Blue", "size": "Small"}));

        let report = manager.validate_attributes_report(&r);
        let messages: Vec<_> = report.violations.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(
            messages,
            ["relationship rule 'one' failed", "relationship rule 'two' failed"]
        );
        assert!(!manager.validate_attributes(&r));
    }

    #[test]
    fn report_agrees_with_boolean_result() {
        let manager = vehicle_manager();
        for r in [
            json!({"vehicle_type": "Car", "model": "SUV"}),
            json!({"vehicle_type": "Car", "model": "Sport"}),
            json!({"vehicle_type": "Truck", "model": "SUV"}),
            json!({}),
        ] {
            let r = record(r);
            assert_eq!(
                manager.validate_attributes_report(&r).is_valid,
                manager.validate_attributes(&r)
            );
        }
    }

    #[test]
    fn set_validation_and_unknown_set() {
        let mut manager = AttributeManager::new();
        manager.add_attribute_set(
            AttributeGroup::new("basic_set")
                .with_attribute(Attribute::text("product_name"))
                .with_attribute(Attribute::select("color", ["Red", "Blue", "Green"])),
        );
        let r = record(json!({"product_name": "Sample Product", "color": "Blue"}));
        assert!(manager.validate_attribute_set("basic_set", &r));
        assert!(!manager.validate_attribute_set("missing", &r));
    }

    #[test]
    fn sets_are_upserted() {
        let mut manager = AttributeManager::new();
        manager.add_attribute_set(AttributeSet::new("s").with_attribute(Attribute::text("a")));
        manager.add_attribute_set(AttributeSet::new("s").with_attribute(Attribute::number("a")));
        assert!(!manager.validate_attribute_set("s", &record(json!({"a": "x"}))));
        assert_eq!(manager.attribute_set("s").unwrap().len(), 1);
    }

    #[test]
    fn sets_ignore_relationships() {
        let mut manager = color_size_manager();
        manager.add_attribute_set(
            AttributeSet::new("apparel")
                .with_attribute(Attribute::select("color", ["Red", "Blue", "Green"]))
                .with_attribute(Attribute::select("size", ["Small", "Medium", "Large"])),
        );
        let r = record(json!({"color": "Red", "size": "Small"}));
        assert!(manager.validate_attribute_set("apparel", &r));
        assert!(!manager.validate_attributes(&r));
    }

    #[test]
    fn duplicate_profile_is_rejected_and_original_kept() {
        let mut manager = AttributeManager::new();
        manager
            .add_profile(AttributeProfile::new("Electronics").with_attribute(Attribute::text("brand")))
            .unwrap();

        let result = manager.add_profile(AttributeProfile::new("Electronics"));
        assert_matches!(result, Err(CoreError::DuplicateProfile(name)) if name == "Electronics");
        assert_eq!(manager.profile("Electronics").unwrap().len(), 1);
    }

    #[test]
    fn profile_validation_and_unknown_profile() {
        let mut manager = AttributeManager::new();
        manager
            .add_profile(
                AttributeProfile::new("Electronics")
                    .with_attribute(Attribute::text("brand"))
                    .with_attribute(Attribute::number("power_consumption")),
            )
            .unwrap();

        let valid = record(json!({"brand": "Samsung", "power_consumption": 15}));
        let invalid = record(json!({"brand": "Samsung", "power_consumption": "invalid"}));
        assert!(manager.validate_profile("Electronics", &valid));
        assert!(!manager.validate_profile("Electronics", &invalid));
        assert!(!manager.validate_profile("Electronics Invalid", &valid));
    }

    #[test]
    fn sets_and_profiles_have_separate_namespaces() {
        let mut manager = AttributeManager::new();
        manager.add_attribute_set(AttributeSet::new("shared").with_attribute(Attribute::text("a")));
        manager
            .add_profile(AttributeProfile::new("shared").with_attribute(Attribute::number("a")))
            .unwrap();
        let r = record(json!({"a": "text"}));
        assert!(manager.validate_attribute_set("shared", &r));
        assert!(!manager.validate_profile("shared", &r));
    }

    #[test]
    fn update_records_ordered_history() {
        let mut manager = AttributeManager::new();
        manager.add_attribute(Attribute::number("price"));

        assert!(manager.update_attribute("price", 19.99, "admin"));
        assert!(manager.update_attribute("price", 24.99, "editor"));

        let history = manager.attribute_history("price");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].old_value, None);
        assert_eq!(history[0].new_value, AttributeValue::from(19.99));
        assert_eq!(history[1].old_value, Some(AttributeValue::from(19.99)));
        assert_eq!(history[1].new_value, AttributeValue::from(24.99));
        assert_eq!(history[1].changed_by, "editor");
        assert!(history[0].changed_at <= history[1].changed_at);
        assert_eq!(
            manager.attribute("price").unwrap().value(),
            Some(&AttributeValue::from(24.99))
        );
    }

    #[test]
    fn update_of_unknown_attribute_emits_nothing() {
        let mut manager = AttributeManager::new();
        assert!(!manager.update_attribute("ghost", "boo", "admin"));
        assert!(manager.full_history().is_empty());
    }

    #[test]
    fn full_history_spans_attributes() {
        let mut manager = AttributeManager::new();
        manager.add_attribute(Attribute::number("price"));
        manager.add_attribute(Attribute::text("name"));
        manager.update_attribute("price", 1, "a");
        manager.update_attribute("name", "Widget", "b");
        manager.update_attribute("price", 2, "a");

        let names: Vec<_> = manager
            .full_history()
            .iter()
            .map(|c| c.attribute.as_str())
            .collect();
        assert_eq!(names, ["price", "name", "price"]);
    }

    #[test]
    fn configured_date_formats_apply_to_validation() {
        let config = EngineConfig {
            date_formats: vec!["%d.%m.%Y".to_string()],
            ..EngineConfig::default()
        };
        let mut manager = AttributeManager::with_config(config).unwrap();
        manager.add_attribute(Attribute::date("release_date"));
        assert!(manager.validate_attributes(&record(json!({"release_date": "15.09.2024"}))));
        assert!(!manager.validate_attributes(&record(json!({"release_date": "15/09/2024"}))));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = EngineConfig {
            date_formats: Vec::new(),
            ..EngineConfig::default()
        };
        assert_matches!(
            AttributeManager::with_config(config.clone()),
            Err(CoreError::Config(_))
        );
        assert_matches!(
            AttributeManager::with_sink(config, AttributeHistory::new()),
            Err(CoreError::Config(_))
        );
    }

    #[test]
    fn manager_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AttributeManager>();
    }
}
