//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use attrisuite_core::{
    Attribute, AttributeManager, AttributeRelationship, AttributeValue, ChangeSink,
    DependentAttribute, EngineConfig, Record, RelationshipRule, SelectAttribute,
};

/// Build a record from a JSON object literal.
pub fn record(value: serde_json::Value) -> Record {
    Record::from_json(value).expect("fixture records are JSON objects")
}

/// Register the vehicle catalogue: `vehicle_type` drives the `model` menu.
pub fn register_vehicles<S: ChangeSink>(manager: &mut AttributeManager<S>) {
    manager.add_attribute(Attribute::select("vehicle_type", ["Car", "Motorcycle"]));
    manager.add_attribute(Attribute::dependent(
        "model",
        DependentAttribute::new("vehicle_type")
            .with_dependency("Car", SelectAttribute::new("model", ["Sedan", "SUV", "Coupe"]))
            .with_dependency("Motorcycle", SelectAttribute::new("model", ["Sport", "Cruiser"])),
    ));
}

/// Register `color` and `size` with the rule "Red excludes Small".
pub fn register_apparel<S: ChangeSink>(manager: &mut AttributeManager<S>) {
    let color = Attribute::select("color", ["Red", "Blue", "Green"]);
    let size = Attribute::select("size", ["Small", "Medium", "Large"]);

    manager.add_relationship(
        AttributeRelationship::new("one-to-one", color.clone())
            .with_target(size.clone())
            .with_rule(
                RelationshipRule::new(|source, targets, record| {
                    let source_value = record.get(source.name());
                    !targets.iter().any(|target| {
                        source_value == Some(&AttributeValue::from("Red"))
                            && record.get(target.name()) == Some(&AttributeValue::from("Small"))
                    })
                })
                .labeled("red excludes small"),
            ),
    );
    manager.add_attribute(color);
    manager.add_attribute(size);
}

pub fn default_config() -> EngineConfig {
    EngineConfig::default()
}
