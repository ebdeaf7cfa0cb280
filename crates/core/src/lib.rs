//! Attribute definition and validation engine.
//!
//! Defines typed attributes for product-like entities, groups them into
//! sets and profiles, expresses cross-attribute relationships and
//! parent/child dependencies, and validates flat records against those
//! definitions while logging value changes to a history sink.
//!
//! ```
//! use attrisuite_core::{Attribute, AttributeManager, DependentAttribute, Record, SelectAttribute};
//!
//! let mut manager = AttributeManager::new();
//! manager.add_attribute(Attribute::select("vehicle_type", ["Car", "Motorcycle"]));
//! manager.add_attribute(Attribute::dependent(
//!     "model",
//!     DependentAttribute::new("vehicle_type")
//!         .with_dependency("Car", SelectAttribute::new("model", ["Sedan", "SUV", "Coupe"])),
//! ));
//!
//! let record = Record::new().with("vehicle_type", "Car").with("model", "SUV");
//! assert!(manager.validate_attributes(&record));
//! ```

pub mod attribute;
pub mod audit;
pub mod config;
pub mod dependent;
pub mod error;
pub mod group;
pub mod history;
pub mod manager;
pub mod relationship;
pub mod report;
pub mod rules;
pub mod select;
pub mod telemetry;
pub mod types;
pub mod value;

pub use attribute::{Attribute, AttributeKind, AttributeType, Rejection, Translations};
pub use audit::AuditLog;
pub use config::EngineConfig;
pub use dependent::DependentAttribute;
pub use error::CoreError;
pub use group::{AttributeGroup, AttributeProfile, AttributeSet};
pub use history::{AttributeHistory, ChangeRecord, ChangeSink, HistoryQuery, Tee};
pub use manager::AttributeManager;
pub use relationship::AttributeRelationship;
pub use report::{FieldViolation, ValidationReport};
pub use rules::{RelationshipRule, ValueRule};
pub use select::{SelectAttribute, SelectOptions};
pub use value::{AttributeValue, FileDescriptor, Record};
