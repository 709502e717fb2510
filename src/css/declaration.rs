//! Ordered property bags

use super::property::{Property, PropertyBuilder, PropertyValue, kebab_to_camel};
use indexmap::IndexMap;
use indexmap::map::{Iter, Keys};
use serde_json::Value;

/// Properties keyed by `name_with_state`, kept in insertion order.
///
/// Insertion order matters: it is the order the cascade merges in and the order the
/// inspector displays. Overwriting a key keeps its original position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleDeclaration {
    properties: IndexMap<String, Property>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        Self {
            properties: IndexMap::new(),
        }
    }

    /// Builds a declaration from a JSON object, skipping `_`-prefixed meta keys.
    pub fn from_json(object: &serde_json::Map<String, Value>) -> Self {
        let mut declaration = Self::new();
        for (key, value) in object {
            if key.starts_with('_') {
                continue;
            }
            declaration.set_property(Property::new(key, value.clone()));
        }
        declaration
    }

    pub fn set_property(&mut self, property: Property) {
        self.properties
            .insert(property.name_with_state().to_string(), property);
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn property_value(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key).map(Property::value)
    }

    pub fn remove_property(&mut self, key: &str) -> Option<Property> {
        self.properties.shift_remove(key)
    }

    /// Merges `source` into `self`: existing keys are overwritten in place, new keys are
    /// appended in `source` order.
    pub fn set_all(&mut self, source: &StyleDeclaration) {
        for (key, property) in &source.properties {
            self.properties.insert(key.clone(), property.clone());
        }
    }

    /// Replaces every value with [`PropertyValue::Undefined`], keeping keys and order.
    pub fn reset_to_undefined(&mut self) {
        for property in self.properties.values_mut() {
            *property = PropertyBuilder::from_property(property)
                .value(PropertyValue::Undefined)
                .build();
        }
    }

    /// Inspector edit entry point; accepts kebab-case names.
    pub fn set_inspector_property(&mut self, name: &str, value: &str, disabled: bool) {
        let property = PropertyBuilder::new()
            .name_with_state(&kebab_to_camel(name))
            .value(value)
            .disabled(disabled)
            .build();
        self.set_property(property);
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn keys(&self) -> Keys<'_, String, Property> {
        self.properties.keys()
    }

    pub fn iter(&self) -> Iter<'_, String, Property> {
        self.properties.iter()
    }

    pub fn properties(&self) -> impl DoubleEndedIterator<Item = &Property> {
        self.properties.values()
    }

    /// Style map for the view binding layer. Properties reset to `Undefined` are kept as
    /// `null` so the view clears them.
    pub fn to_style_map(&self) -> IndexMap<String, Value> {
        self.properties
            .iter()
            .map(|(key, property)| {
                let value = property.value().as_value().cloned().unwrap_or(Value::Null);
                (key.clone(), value)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a StyleDeclaration {
    type Item = (&'a String, &'a Property);
    type IntoIter = Iter<'a, String, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

impl FromIterator<Property> for StyleDeclaration {
    fn from_iter<T: IntoIterator<Item = Property>>(iter: T) -> Self {
        let mut declaration = StyleDeclaration::new();
        for property in iter {
            declaration.set_property(property);
        }
        declaration
    }
}
