//! Style properties and their values

use serde_json::Value;
use std::fmt;

/// State prefix used for properties that only apply through a pseudo-state listener.
pub const PSEUDO_STATE: &str = "pseudo";

/// Value held by a style property.
///
/// `Undefined` is the explicit "override to empty" marker: a property that was set by an
/// earlier cascade pass and is no longer contributed by any rule.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Undefined,
    Value(Value),
}

impl PropertyValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, PropertyValue::Undefined)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            PropertyValue::Value(value) => Some(value),
            PropertyValue::Undefined => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Text shown to the inspector for this value.
    pub fn to_text(&self) -> String {
        match self {
            PropertyValue::Undefined => String::from("undefined"),
            PropertyValue::Value(Value::String(s)) => s.clone(),
            PropertyValue::Value(other) => other.to_string(),
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Value(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Value(Value::String(value.to_string()))
    }
}

/// A single declaration entry, e.g. `width:active: 10px`.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    name_with_state: String,
    name_without_state: String,
    state: Option<String>,
    value: PropertyValue,
    disabled: bool,
}

impl Property {
    pub fn new(name_with_state: &str, value: impl Into<PropertyValue>) -> Self {
        PropertyBuilder::new()
            .name_with_state(name_with_state)
            .value(value)
            .build()
    }

    /// Key of the property inside a declaration.
    pub fn name_with_state(&self) -> &str {
        &self.name_with_state
    }

    pub fn name_without_state(&self) -> &str {
        &self.name_without_state
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_pseudo(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|state| state.starts_with(PSEUDO_STATE))
    }

    /// Kebab-case name used by the inspector (`backgroundColor` -> `background-color`).
    pub fn inspector_name(&self) -> String {
        let mut name = camel_to_kebab(&self.name_without_state);
        if let Some(state) = &self.state {
            name.push(':');
            name.push_str(state);
        }
        name
    }

    pub fn value_text(&self) -> String {
        self.value.to_text()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name_with_state, self.value.to_text())
    }
}

/// Builds new properties, or modified copies of existing ones.
#[derive(Clone, Debug)]
pub struct PropertyBuilder {
    name_without_state: String,
    state: Option<String>,
    value: PropertyValue,
    disabled: bool,
}

impl PropertyBuilder {
    pub fn new() -> Self {
        Self {
            name_without_state: String::new(),
            state: None,
            value: PropertyValue::Undefined,
            disabled: false,
        }
    }

    pub fn from_property(property: &Property) -> Self {
        Self {
            name_without_state: property.name_without_state.clone(),
            state: property.state.clone(),
            value: property.value.clone(),
            disabled: property.disabled,
        }
    }

    /// Splits `name:state` into its two halves. Only the first `:` separates them.
    pub fn name_with_state(mut self, name_with_state: &str) -> Self {
        match name_with_state.split_once(':') {
            Some((name, state)) => {
                self.name_without_state = name.to_string();
                self.state = Some(state.to_string());
            }
            None => {
                self.name_without_state = name_with_state.to_string();
                self.state = None;
            }
        }
        self
    }

    pub fn name_without_state(mut self, name: &str) -> Self {
        self.name_without_state = name.to_string();
        self
    }

    pub fn state(mut self, state: Option<&str>) -> Self {
        self.state = state.map(str::to_string);
        self
    }

    pub fn value(mut self, value: impl Into<PropertyValue>) -> Self {
        self.value = value.into();
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn build(self) -> Property {
        let name_with_state = match &self.state {
            Some(state) => format!("{}:{}", self.name_without_state, state),
            None => self.name_without_state.clone(),
        };
        Property {
            name_with_state,
            name_without_state: self.name_without_state,
            state: self.state,
            value: self.value,
            disabled: self.disabled,
        }
    }
}

impl Default for PropertyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn kebab_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' && !out.is_empty() {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
