//! Form definition types
//!
//! Two layers:
//! - `FormDefinition` and friends are the serialized form (JSON, expressions
//!   unresolved).
//! - `FieldDescriptor` / `GroupDescriptor` are what the engine is built from,
//!   with functions already resolved.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::EngineConfig;
use super::errors::{FormError, FormResult};
use crate::functions::{Expr, FunctionLibrary, FunctionRef};

/// A field as declared in a definition file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field id
    pub id: String,
    /// Initial value when no preset and no autofill applies
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autofill: Option<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plausi: Option<Expr>,
    /// Visibility groups this field belongs to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

/// A visibility rule as declared in a definition file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expr>,
}

/// Complete form definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDefinition {
    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
    /// Fields in declaration order
    pub fields: Vec<FieldSpec>,
    /// Visibility rules
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    /// Preset overrides by field id (e.g. values stored in a document)
    #[serde(default)]
    pub presets: BTreeMap<String, String>,
}

impl FormDefinition {
    /// Validates the definition structure itself (not the functions)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.fields.is_empty() {
            return Err("form must declare at least one field".into());
        }

        for (index, field) in self.fields.iter().enumerate() {
            if field.id.trim().is_empty() {
                return Err(format!("field #{} has an empty id", index));
            }
            if field.groups.iter().any(|g| g.trim().is_empty()) {
                return Err(format!("field '{}' names an empty group id", field.id));
            }
        }

        for (index, group) in self.groups.iter().enumerate() {
            if group.id.trim().is_empty() {
                return Err(format!("group #{} has an empty id", index));
            }
        }

        self.engine.validate().map_err(|e| e.message().to_string())?;
        Ok(())
    }

    /// Resolve every expression against a function library
    pub fn resolve(
        &self,
        library: &FunctionLibrary,
    ) -> FormResult<(Vec<FieldDescriptor>, Vec<GroupDescriptor>)> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for spec in &self.fields {
            let mut field = FieldDescriptor::new(&spec.id).with_value(&spec.value);
            if let Some(expr) = &spec.autofill {
                let f = library
                    .resolve(expr)
                    .map_err(|e| FormError::invalid_function(&spec.id, "autofill", &e))?;
                field = field.with_autofill(f);
            }
            if let Some(expr) = &spec.plausi {
                let f = library
                    .resolve(expr)
                    .map_err(|e| FormError::invalid_function(&spec.id, "plausi", &e))?;
                field = field.with_plausi(f);
            }
            for group in &spec.groups {
                field = field.in_group(group);
            }
            fields.push(field);
        }

        let mut groups = Vec::with_capacity(self.groups.len());
        for spec in &self.groups {
            let mut group = GroupDescriptor::new(&spec.id);
            if let Some(expr) = &spec.condition {
                let f = library
                    .resolve(expr)
                    .map_err(|e| FormError::invalid_function(&spec.id, "visibility", &e))?;
                group = group.with_condition(f);
            }
            groups.push(group);
        }

        Ok((fields, groups))
    }

    /// Names of every function dialog any expression reads
    pub fn dialog_names(&self) -> BTreeSet<String> {
        let field_exprs = self
            .fields
            .iter()
            .flat_map(|f| f.autofill.iter().chain(f.plausi.iter()));
        let group_exprs = self.groups.iter().filter_map(|g| g.condition.as_ref());
        field_exprs
            .chain(group_exprs)
            .flat_map(|expr| expr.dialog_names())
            .collect()
    }

    /// Preset overrides, with the configured marker mapped to `NeedsReview`
    pub fn preset_overrides(&self) -> BTreeMap<String, Preset> {
        self.presets
            .iter()
            .map(|(id, raw)| {
                (
                    id.clone(),
                    Preset::from_raw(raw, &self.engine.needs_review_marker),
                )
            })
            .collect()
    }
}

/// A value preset for one field, overriding its initial autofill
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preset {
    /// Keep this value
    Value(String),
    /// The stored value is doubtful and must be reviewed by the user
    NeedsReview,
}

impl Preset {
    /// Interpret a raw stored value
    pub fn from_raw(raw: &str, needs_review_marker: &str) -> Self {
        if raw == needs_review_marker {
            Preset::NeedsReview
        } else {
            Preset::Value(raw.to_string())
        }
    }
}

/// A field ready for engine construction
#[derive(Clone)]
pub struct FieldDescriptor {
    pub id: String,
    pub initial_value: String,
    pub autofill: Option<FunctionRef>,
    pub plausi: Option<FunctionRef>,
    pub groups: Vec<String>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initial_value: String::new(),
            autofill: None,
            plausi: None,
            groups: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = value.into();
        self
    }

    pub fn with_autofill(mut self, function: FunctionRef) -> Self {
        self.autofill = Some(function);
        self
    }

    pub fn with_plausi(mut self, function: FunctionRef) -> Self {
        self.plausi = Some(function);
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("id", &self.id)
            .field("initial_value", &self.initial_value)
            .field("autofill", &self.autofill.as_ref().map(|a| a.parameters().to_vec()))
            .field("plausi", &self.plausi.as_ref().map(|p| p.parameters().to_vec()))
            .field("groups", &self.groups)
            .finish()
    }
}

/// A visibility group ready for engine construction
#[derive(Clone)]
pub struct GroupDescriptor {
    pub id: String,
    pub condition: Option<FunctionRef>,
}

impl GroupDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, function: FunctionRef) -> Self {
        self.condition = Some(function);
        self
    }
}

impl fmt::Debug for GroupDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupDescriptor")
            .field("id", &self.id)
            .field(
                "condition",
                &self.condition.as_ref().map(|c| c.parameters().to_vec()),
            )
            .finish()
    }
}
