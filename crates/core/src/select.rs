//! Option lists for select-style attributes.

use serde::{Deserialize, Serialize};

use crate::value::AttributeValue;

/// An ordered, duplicate-free list of allowed text options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SelectOptions(Vec<String>);

impl SelectOptions {
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for option in options {
            let option = option.into();
            if !list.contains(&option) {
                list.push(option);
            }
        }
        Self(list)
    }

    /// Strict membership: only a text value equal to an option matches.
    pub fn contains(&self, value: &AttributeValue) -> bool {
        value
            .as_text()
            .is_some_and(|text| self.0.iter().any(|option| option == text))
    }

    /// Every element of a list value must be an allowed option.
    ///
    /// Non-list values never match. An empty list matches.
    pub fn contains_all(&self, value: &AttributeValue) -> bool {
        value
            .as_list()
            .is_some_and(|items| items.iter().all(|item| self.contains(item)))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for SelectOptions {
    fn from(options: Vec<String>) -> Self {
        Self::new(options)
    }
}

impl From<SelectOptions> for Vec<String> {
    fn from(options: SelectOptions) -> Self {
        options.0
    }
}

/// A named option list, used as a child option set of a dependent
/// attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectAttribute {
    name: String,
    options: SelectOptions,
}

impl SelectAttribute {
    pub fn new<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            options: SelectOptions::new(options),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &SelectOptions {
        &self.options
    }

    pub fn validate(&self, value: &AttributeValue) -> bool {
        self.options.contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_keep_first_occurrence_order() {
        let options = SelectOptions::new(["Red", "Blue", "Red", "Green"]);
        assert_eq!(options.as_slice(), ["Red", "Blue", "Green"]);
    }

    #[test]
    fn membership_is_strict() {
        let sizes = SelectOptions::new(["1", "2"]);
        assert!(sizes.contains(&AttributeValue::from("1")));
        // An integer never equals a text option.
        assert!(!sizes.contains(&AttributeValue::Integer(1)));
        assert!(!sizes.contains(&AttributeValue::from("1 ")));
    }

    #[test]
    fn contains_all_checks_each_element() {
        let options = SelectOptions::new(["Red", "Blue"]);
        assert!(options.contains_all(&AttributeValue::from(vec!["Red", "Blue"])));
        assert!(options.contains_all(&AttributeValue::List(vec![])));
        assert!(!options.contains_all(&AttributeValue::from(vec!["Red", "Pink"])));
        assert!(!options.contains_all(&AttributeValue::from("Red")));
    }

    #[test]
    fn select_attribute_validates_against_its_options() {
        let color = SelectAttribute::new("color", ["Red", "Blue", "Green"]);
        assert_eq!(color.name(), "color");
        assert!(color.validate(&AttributeValue::from("Red")));
        assert!(!color.validate(&AttributeValue::from("Yellow")));
    }
}
