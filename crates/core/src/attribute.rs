//! Attribute definitions and their per-type validation predicates.
//!
//! An [`Attribute`] is a named, typed field definition. Its type is fixed at
//! construction; validation is a pure function of the type configuration,
//! the value, and any attached [`ValueRule`]s. Type mismatches are ordinary
//! validation failures, never errors.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::{self, EngineConfig};
use crate::dependent::{DependencyFailure, DependentAttribute};
use crate::error::CoreError;
use crate::rules::ValueRule;
use crate::select::SelectOptions;
use crate::value::{AttributeValue, FileDescriptor, Record};

// ---------------------------------------------------------------------------
// Type tag
// ---------------------------------------------------------------------------

/// The declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Text,
    Number,
    Boolean,
    Select,
    Multiselect,
    Date,
    File,
    NumericRange,
    Custom,
    Localized,
}

impl AttributeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Select => "select",
            Self::Multiselect => "multiselect",
            Self::Date => "date",
            Self::File => "file",
            Self::NumericRange => "numeric_range",
            Self::Custom => "custom",
            Self::Localized => "localized",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Per-type configuration
// ---------------------------------------------------------------------------

/// Allow-list and size cap for file attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConstraints {
    pub allowed_types: Vec<String>,
    pub max_size: u64,
}

impl FileConstraints {
    pub fn allows(&self, file: &FileDescriptor) -> bool {
        self.allowed_types.iter().any(|t| *t == file.file_type) && file.size <= self.max_size
    }
}

/// Inclusive numeric bounds. Always finite with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericBounds {
    min: f64,
    max: f64,
}

impl NumericBounds {
    pub fn new(min: f64, max: f64) -> Result<Self, CoreError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(CoreError::InvalidDefinition(format!(
                "numeric range bounds must be finite, got [{min}, {max}]"
            )));
        }
        if min > max {
            return Err(CoreError::InvalidDefinition(format!(
                "numeric range minimum {min} exceeds maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// No effective bounds.
    pub fn unbounded() -> Self {
        Self {
            min: f64::MIN,
            max: f64::MAX,
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, n: f64) -> bool {
        self.min <= n && n <= self.max
    }
}

/// Display name and description of an attribute in one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub name: String,
    pub description: String,
}

/// Translations of a localized attribute, keyed by locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translations(BTreeMap<String, Translation>);

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        locale: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.insert(locale, name, description);
        self
    }

    pub fn insert(
        &mut self,
        locale: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.0.insert(
            locale.into(),
            Translation {
                name: name.into(),
                description: description.into(),
            },
        );
    }

    pub fn get(&self, locale: &str) -> Option<&Translation> {
        self.0.get(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Type-specific configuration carried by an [`Attribute`].
#[derive(Debug, Clone)]
pub enum AttributeKind {
    Text,
    Number,
    Boolean,
    Select(SelectOptions),
    Multiselect(SelectOptions),
    Date,
    File(FileConstraints),
    NumericRange(NumericBounds),
    Custom,
    Localized(Translations),
    Dependent(DependentAttribute),
}

impl AttributeKind {
    /// Declared type. A dependent attribute is a select.
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::Text => AttributeType::Text,
            Self::Number => AttributeType::Number,
            Self::Boolean => AttributeType::Boolean,
            Self::Select(_) | Self::Dependent(_) => AttributeType::Select,
            Self::Multiselect(_) => AttributeType::Multiselect,
            Self::Date => AttributeType::Date,
            Self::File(_) => AttributeType::File,
            Self::NumericRange(_) => AttributeType::NumericRange,
            Self::Custom => AttributeType::Custom,
            Self::Localized(_) => AttributeType::Localized,
        }
    }

    fn unconfigured(attribute_type: AttributeType) -> Self {
        match attribute_type {
            AttributeType::Text => Self::Text,
            AttributeType::Number => Self::Number,
            AttributeType::Boolean => Self::Boolean,
            AttributeType::Select => Self::Select(SelectOptions::default()),
            AttributeType::Multiselect => Self::Multiselect(SelectOptions::default()),
            AttributeType::Date => Self::Date,
            AttributeType::File => Self::File(FileConstraints::default()),
            AttributeType::NumericRange => Self::NumericRange(NumericBounds::unbounded()),
            AttributeType::Custom => Self::Custom,
            AttributeType::Localized => Self::Localized(Translations::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

/// Why a value failed an attribute's validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("expected a {expected} value, got {found}")]
    TypeMismatch {
        expected: AttributeType,
        found: &'static str,
    },

    #[error("value is not one of the allowed options")]
    NotAnOption,

    #[error("value is outside [{min}, {max}]")]
    OutOfRange { min: f64, max: f64 },

    #[error("file type or size is not allowed")]
    FileNotAllowed,

    #[error("value is not a recognized date")]
    InvalidDate,

    #[error("rule {} failed", rule_name(.index, .label))]
    RuleFailed { index: usize, label: Option<String> },

    #[error(transparent)]
    Dependency(#[from] DependencyFailure),
}

fn rule_name(index: &usize, label: &Option<String>) -> String {
    match label {
        Some(label) => format!("'{label}'"),
        None => format!("#{}", index + 1),
    }
}

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// A named, typed field definition.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
    rules: Vec<ValueRule>,
    value: Option<AttributeValue>,
    description: Option<String>,
}

impl Attribute {
    fn with_kind(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            rules: Vec::new(),
            value: None,
            description: None,
        }
    }

    /// Create an attribute of `attribute_type` with empty configuration:
    /// selects allow nothing, files allow nothing, ranges are unbounded.
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self::with_kind(name, AttributeKind::unconfigured(attribute_type))
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::with_kind(name, AttributeKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::with_kind(name, AttributeKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_kind(name, AttributeKind::Boolean)
    }

    pub fn select<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(name, AttributeKind::Select(SelectOptions::new(options)))
    }

    pub fn multiselect<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(name, AttributeKind::Multiselect(SelectOptions::new(options)))
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::with_kind(name, AttributeKind::Date)
    }

    pub fn file<I, S>(name: impl Into<String>, allowed_types: I, max_size: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            name,
            AttributeKind::File(FileConstraints {
                allowed_types: allowed_types.into_iter().map(Into::into).collect(),
                max_size,
            }),
        )
    }

    /// Fails when a bound is not finite or `min > max`.
    pub fn numeric_range(name: impl Into<String>, min: f64, max: f64) -> Result<Self, CoreError> {
        let bounds = NumericBounds::new(min, max)?;
        Ok(Self::with_kind(name, AttributeKind::NumericRange(bounds)))
    }

    /// An attribute validated only by its attached rules.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::with_kind(name, AttributeKind::Custom)
    }

    pub fn localized(name: impl Into<String>, translations: Translations) -> Self {
        Self::with_kind(name, AttributeKind::Localized(translations))
    }

    pub fn dependent(name: impl Into<String>, dependent: DependentAttribute) -> Self {
        Self::with_kind(name, AttributeKind::Dependent(dependent))
    }

    pub fn with_rule(mut self, rule: ValueRule) -> Self {
        self.add_rule(rule);
        self
    }

    /// Attach a rule. Rules run after the type check, in attachment order.
    pub fn add_rule(&mut self, rule: ValueRule) {
        self.rules.push(rule);
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<AttributeValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    // -- accessors ----------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.kind.attribute_type()
    }

    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    pub fn rules(&self) -> &[ValueRule] {
        &self.rules
    }

    pub fn value(&self) -> Option<&AttributeValue> {
        self.value.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Allowed options for select, multiselect and dependent attributes.
    pub fn options(&self) -> Option<&SelectOptions> {
        match &self.kind {
            AttributeKind::Select(options) | AttributeKind::Multiselect(options) => Some(options),
            AttributeKind::Dependent(dependent) => Some(dependent.options()),
            _ => None,
        }
    }

    pub fn as_dependent(&self) -> Option<&DependentAttribute> {
        match &self.kind {
            AttributeKind::Dependent(dependent) => Some(dependent),
            _ => None,
        }
    }

    pub fn parent_attribute_name(&self) -> Option<&str> {
        self.as_dependent().map(DependentAttribute::parent_attribute)
    }

    /// Display name and description for `locale`.
    ///
    /// Falls back to the attribute name and an empty description when the
    /// attribute is not localized or has no entry for the locale.
    pub fn translation(&self, locale: &str) -> Translation {
        let found = match &self.kind {
            AttributeKind::Localized(translations) => translations.get(locale).cloned(),
            _ => None,
        };
        found.unwrap_or_else(|| Translation {
            name: self.name.clone(),
            description: String::new(),
        })
    }

    /// Replace the current value, returning the previous one.
    pub(crate) fn replace_value(&mut self, value: AttributeValue) -> Option<AttributeValue> {
        self.value.replace(value)
    }

    // -- validation ---------------------------------------------------------

    /// Validate a standalone value using the default date formats.
    pub fn validate(&self, value: &AttributeValue) -> bool {
        self.check(value, config::defaults()).is_ok()
    }

    pub fn validate_with_config(&self, value: &AttributeValue, config: &EngineConfig) -> bool {
        self.check(value, config).is_ok()
    }

    /// Validate a standalone value, reporting the first reason for failure.
    ///
    /// The type check runs first, then each rule in attachment order.
    pub fn check(&self, value: &AttributeValue, config: &EngineConfig) -> Result<(), Rejection> {
        self.check_kind(value, config)?;
        self.check_rules(value)
    }

    /// Validate this attribute as it appears in `record`.
    ///
    /// Ordinary attributes ignore the rest of the record: an absent (or null)
    /// entry passes, a present one is checked. Dependent attributes resolve
    /// their parent's value from the record first.
    pub fn resolve_with_context(&self, record: &Record) -> bool {
        self.check_in_record(record, config::defaults()).is_ok()
    }

    pub fn check_in_record(&self, record: &Record, config: &EngineConfig) -> Result<(), Rejection> {
        if let AttributeKind::Dependent(dependent) = &self.kind {
            let parent_value = record.get(dependent.parent_attribute());
            dependent.resolve(&self.name, parent_value, record)?;
            // Attached rules still apply to the resolved value.
            if let Some(value) = record.get(&self.name) {
                self.check_rules(value)?;
            }
            return Ok(());
        }

        match record.get(&self.name) {
            Some(value) if !value.is_null() => self.check(value, config),
            _ => Ok(()),
        }
    }

    fn check_rules(&self, value: &AttributeValue) -> Result<(), Rejection> {
        match self.rules.iter().position(|rule| !rule.evaluate(value)) {
            Some(index) => Err(Rejection::RuleFailed {
                index,
                label: self.rules[index].label().map(str::to_string),
            }),
            None => Ok(()),
        }
    }

    fn check_kind(&self, value: &AttributeValue, config: &EngineConfig) -> Result<(), Rejection> {
        let mismatch = || Rejection::TypeMismatch {
            expected: self.attribute_type(),
            found: value.kind_name(),
        };

        match &self.kind {
            AttributeKind::Text | AttributeKind::Localized(_) => {
                value.as_text().map(|_| ()).ok_or_else(mismatch)
            }
            AttributeKind::Number => value.as_number().map(|_| ()).ok_or_else(mismatch),
            AttributeKind::Boolean => match value {
                AttributeValue::Bool(_) => Ok(()),
                _ => Err(mismatch()),
            },
            AttributeKind::Select(options) => {
                check_option(options, value).map_err(|e| e.unwrap_or_else(mismatch))
            }
            AttributeKind::Dependent(dependent) => {
                check_option(dependent.options(), value).map_err(|e| e.unwrap_or_else(mismatch))
            }
            AttributeKind::Multiselect(options) => {
                if value.as_list().is_none() {
                    Err(mismatch())
                } else if options.contains_all(value) {
                    Ok(())
                } else {
                    Err(Rejection::NotAnOption)
                }
            }
            AttributeKind::Date => {
                let text = value.as_text().ok_or_else(mismatch)?;
                if is_date(text, &config.date_formats) {
                    Ok(())
                } else {
                    Err(Rejection::InvalidDate)
                }
            }
            AttributeKind::File(constraints) => {
                let file = FileDescriptor::from_value(value).ok_or_else(mismatch)?;
                if constraints.allows(&file) {
                    Ok(())
                } else {
                    Err(Rejection::FileNotAllowed)
                }
            }
            AttributeKind::NumericRange(bounds) => {
                let n = value.as_number().ok_or_else(mismatch)?;
                if bounds.contains(n) {
                    Ok(())
                } else {
                    Err(Rejection::OutOfRange {
                        min: bounds.min(),
                        max: bounds.max(),
                    })
                }
            }
            AttributeKind::Custom => Ok(()),
        }
    }
}

/// `Err(None)` signals a non-text value; the caller maps it to a type
/// mismatch.
fn check_option(options: &SelectOptions, value: &AttributeValue) -> Result<(), Option<Rejection>> {
    if value.as_text().is_none() {
        Err(None)
    } else if options.contains(value) {
        Ok(())
    } else {
        Err(Some(Rejection::NotAnOption))
    }
}

/// Whether `text` is an RFC 3339 timestamp or matches one of `formats`
/// as a date or date-time.
fn is_date(text: &str, formats: &[String]) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    if DateTime::parse_from_rfc3339(text).is_ok() {
        return true;
    }
    formats.iter().any(|format| {
        NaiveDateTime::parse_from_str(text, format).is_ok()
            || NaiveDate::parse_from_str(text, format).is_ok()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
