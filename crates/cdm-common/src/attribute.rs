//! Variable attributes and their case-insensitive container.

use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::array::Element;
use crate::data_type::DataType;

/// Well-known attribute names consulted by the enhancement pipeline.
pub mod names {
    pub const FILL_VALUE: &str = "_FillValue";
    pub const MISSING_VALUE: &str = "missing_value";
    pub const VALID_MIN: &str = "valid_min";
    pub const VALID_MAX: &str = "valid_max";
    pub const VALID_RANGE: &str = "valid_range";
    pub const SCALE_FACTOR: &str = "scale_factor";
    pub const ADD_OFFSET: &str = "add_offset";
    pub const UNSIGNED: &str = "_Unsigned";
    pub const STANDARDIZE: &str = "standardize";
    pub const UNITS: &str = "units";
    pub const LONG_NAME: &str = "long_name";
}

/// Attribute payload: text or a list of numbers.
///
/// Numbers are held as `f64`; the attribute's declared type is kept separately
/// so type-dependent rules can still see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValues {
    Text(String),
    Numbers(Vec<f64>),
}

/// A named, typed attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    data_type: DataType,
    values: AttributeValues,
}

impl Attribute {
    /// String-valued attribute.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::String,
            values: AttributeValues::Text(value.into()),
        }
    }

    /// Single-valued numeric attribute typed after `T`.
    pub fn scalar<T: Element>(name: impl Into<String>, value: T) -> Self {
        Self::numbers(name, T::DATA_TYPE, vec![value.as_()])
    }

    /// Multi-valued numeric attribute typed after `T`.
    pub fn values<T: Element>(name: impl Into<String>, values: &[T]) -> Self {
        Self::numbers(name, T::DATA_TYPE, values.iter().map(|v| v.as_()).collect())
    }

    /// Numeric attribute with an explicit declared type.
    pub fn numbers(name: impl Into<String>, data_type: DataType, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data_type,
            values: AttributeValues::Numbers(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn value_list(&self) -> &AttributeValues {
        &self.values
    }

    pub fn is_string(&self) -> bool {
        matches!(self.values, AttributeValues::Text(_))
    }

    /// Number of values; a string counts as one.
    pub fn len(&self) -> usize {
        match &self.values {
            AttributeValues::Text(_) => 1,
            AttributeValues::Numbers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.values {
            AttributeValues::Text(s) => Some(s),
            AttributeValues::Numbers(_) => None,
        }
    }

    /// First numeric value.
    pub fn numeric_value(&self) -> Option<f64> {
        self.numeric_value_at(0)
    }

    /// Numeric value at `index`; strings are not parsed.
    pub fn numeric_value_at(&self, index: usize) -> Option<f64> {
        match &self.values {
            AttributeValues::Numbers(v) => v.get(index).copied(),
            AttributeValues::Text(_) => None,
        }
    }

    /// All values as numbers, parsing a string attribute if it holds one.
    pub fn numeric_values(&self) -> Vec<f64> {
        match &self.values {
            AttributeValues::Numbers(v) => v.clone(),
            AttributeValues::Text(s) => s.trim().parse::<f64>().into_iter().collect(),
        }
    }

    /// Boolean reading: `"true"`/`"false"` (any case) or a number, nonzero meaning true.
    pub fn bool_value(&self) -> Option<bool> {
        match &self.values {
            AttributeValues::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            AttributeValues::Numbers(v) => v.first().map(|&x| x != 0.0),
        }
    }
}

/// Attributes of one variable, looked up by case-insensitive name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeContainer {
    attributes: Vec<Attribute>,
}

impl AttributeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, replacing any with the same name (ignoring case).
    pub fn add(&mut self, attribute: Attribute) {
        match self.position(attribute.name()) {
            Some(i) => self.attributes[i] = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, attribute: Attribute) -> Self {
        self.add(attribute);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        self.position(name).map(|i| self.attributes.remove(i))
    }

    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.position(name).map(|i| &self.attributes[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn find_string(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(Attribute::string_value)
    }

    pub fn find_f64(&self, name: &str) -> Option<f64> {
        self.find(name).and_then(Attribute::numeric_value)
    }

    pub fn find_bool(&self, name: &str) -> Option<bool> {
        self.find(name).and_then(Attribute::bool_value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| a.name().eq_ignore_ascii_case(name))
    }
}

impl FromIterator<Attribute> for AttributeContainer {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut container = Self::new();
        for attribute in iter {
            container.add(attribute);
        }
        container
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_ignores_case() {
        let attrs = AttributeContainer::new().with(Attribute::scalar("Scale_Factor", 0.5f32));
        assert_eq!(attrs.find_f64(names::SCALE_FACTOR), Some(0.5));
        assert_eq!(attrs.find("SCALE_FACTOR").unwrap().data_type(), DataType::Float);
    }

    #[test]
    fn test_add_replaces_same_name() {
        let mut attrs = AttributeContainer::new();
        attrs.add(Attribute::string("units", "K"));
        attrs.add(Attribute::string("UNITS", "degC"));
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.find_string("units"), Some("degC"));
    }

    #[test]
    fn test_bool_value() {
        assert_eq!(Attribute::string("_Unsigned", "TRUE").bool_value(), Some(true));
        assert_eq!(Attribute::string("_Unsigned", "false").bool_value(), Some(false));
        assert_eq!(Attribute::string("_Unsigned", "maybe").bool_value(), None);
        assert_eq!(Attribute::scalar("standardize", 1i32).bool_value(), Some(true));
    }

    #[test]
    fn test_numeric_values_parse_text() {
        assert_eq!(Attribute::string("missing_value", " -999 ").numeric_values(), vec![-999.0]);
        assert!(Attribute::string("missing_value", "n/a").numeric_values().is_empty());
    }

    #[test]
    fn test_value_list_of_constructed_values() {
        let attr = Attribute::values("valid_range", &[0i16, 100]);
        assert_eq!(attr.value_list(), &AttributeValues::Numbers(vec![0.0, 100.0]));
        assert_eq!(
            Attribute::string("units", "K").value_list(),
            &AttributeValues::Text("K".to_string())
        );
    }

    #[test]
    fn test_serde_roundtrip_keeps_type() {
        let attr = Attribute::values("valid_range", &[0i16, 100]);
        let json = serde_json::to_string(&attr).unwrap();
        let back: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attr);
    }
}
