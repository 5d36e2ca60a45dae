//! # Value Providers
//!
//! Read-only views over field values, handed to every function evaluation.

use std::collections::HashMap;

/// Read-only view over current field values.
///
/// Ids that are not known read as absent: empty string and `false`.
pub trait ValueProvider {
    /// Whether a field with this id exists
    fn has_value(&self, id: &str) -> bool;

    /// Current value, or the empty string for unknown ids
    fn get_string(&self, id: &str) -> String;

    /// Current value read as a boolean
    fn get_bool(&self, id: &str) -> bool {
        is_true(&self.get_string(id))
    }
}

/// The canonical rendering of a boolean result.
pub fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Whether a string reads as boolean true.
pub fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// A `ValueProvider` over a plain map, for hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MapValues {
    values: HashMap<String, String>,
}

impl MapValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(id.into(), value.into());
        self
    }

    pub fn set(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.values.insert(id.into(), value.into());
    }
}

impl ValueProvider for MapValues {
    fn has_value(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    fn get_string(&self, id: &str) -> String {
        self.values.get(id).cloned().unwrap_or_default()
    }
}
