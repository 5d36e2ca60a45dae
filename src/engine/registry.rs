//! Field Registry
//!
//! Owns every field and group record together with its current state.
//! Fields live in an arena indexed by declaration order, so a slot number is
//! also the field's definition index. Ids map to slots; when an id is
//! declared twice the later field wins lookups while both keep their slots.

use std::collections::HashMap;

use crate::form::{FieldDescriptor, FormError, GroupDescriptor};
use crate::functions::{FunctionRef, ValueProvider};
use crate::observability::{Event, Logger};

/// Runtime state of one field
pub(crate) struct FieldState {
    pub id: String,
    pub value: String,
    pub autofill: Option<FunctionRef>,
    pub plausi: Option<FunctionRef>,
    /// Needs manual review; cleared by the first direct edit or autofill
    pub fishy: bool,
    /// Cached plausibility verdict
    pub okay: bool,
    pub visible: bool,
    /// Slots of the groups this field belongs to
    pub groups: Vec<usize>,
}

/// Runtime state of one visibility group
pub(crate) struct GroupState {
    pub id: String,
    /// Member field slots, in declaration order
    pub members: Vec<usize>,
    /// Every visibility rule declared for the group. The last one is in force.
    pub rules: Vec<FunctionRef>,
    pub visible: bool,
}

impl GroupState {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            members: Vec::new(),
            rules: Vec::new(),
            visible: true,
        }
    }

    /// The condition in force, if any
    pub fn condition(&self) -> Option<&FunctionRef> {
        self.rules.last()
    }
}

/// Arena of fields and groups
#[derive(Default)]
pub(crate) struct FieldRegistry {
    fields: Vec<FieldState>,
    by_id: HashMap<String, usize>,
    groups: Vec<GroupState>,
    group_by_id: HashMap<String, usize>,
}

impl FieldRegistry {
    /// Build the registry from ordered descriptors.
    ///
    /// Groups named only by fields exist without a condition. A second rule
    /// for the same group replaces the first.
    pub fn build(fields: Vec<FieldDescriptor>, groups: Vec<GroupDescriptor>) -> Self {
        let mut registry = FieldRegistry::default();

        for descriptor in fields {
            let slot = registry.fields.len();
            if registry.by_id.insert(descriptor.id.clone(), slot).is_some() {
                let err = FormError::duplicate_field(&descriptor.id);
                Logger::error(
                    Event::FieldDuplicateId,
                    &[
                        ("code", err.code().code()),
                        ("field", &descriptor.id),
                        ("message", err.message()),
                    ],
                );
            }

            let mut group_slots = Vec::with_capacity(descriptor.groups.len());
            for group_id in &descriptor.groups {
                let group = registry.group_slot(group_id);
                if !group_slots.contains(&group) {
                    group_slots.push(group);
                    registry.groups[group].members.push(slot);
                }
            }

            registry.fields.push(FieldState {
                id: descriptor.id,
                value: descriptor.initial_value,
                autofill: descriptor.autofill,
                plausi: descriptor.plausi,
                fishy: false,
                okay: true,
                visible: true,
                groups: group_slots,
            });
        }

        for descriptor in groups {
            let slot = registry.group_slot(&descriptor.id);
            if let Some(condition) = descriptor.condition {
                let group = &mut registry.groups[slot];
                if !group.rules.is_empty() {
                    Logger::warn(Event::GroupRuleDuplicate, &[("group", &group.id)]);
                }
                group.rules.push(condition);
            }
        }

        registry
    }

    fn group_slot(&mut self, id: &str) -> usize {
        if let Some(&slot) = self.group_by_id.get(id) {
            return slot;
        }
        let slot = self.groups.len();
        self.groups.push(GroupState::new(id));
        self.group_by_id.insert(id.to_string(), slot);
        slot
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn group_slot_of(&self, id: &str) -> Option<usize> {
        self.group_by_id.get(id).copied()
    }

    pub fn field(&self, slot: usize) -> &FieldState {
        &self.fields[slot]
    }

    pub fn field_mut(&mut self, slot: usize) -> &mut FieldState {
        &mut self.fields[slot]
    }

    /// Field lookup by id (later declaration wins)
    pub fn field_by_id(&self, id: &str) -> Option<&FieldState> {
        self.slot_of(id).map(|slot| &self.fields[slot])
    }

    pub fn fields(&self) -> &[FieldState] {
        &self.fields
    }

    pub fn group(&self, slot: usize) -> &GroupState {
        &self.groups[slot]
    }

    pub fn group_mut(&mut self, slot: usize) -> &mut GroupState {
        &mut self.groups[slot]
    }

    pub fn groups(&self) -> &[GroupState] {
        &self.groups
    }
}

/// Functions read the registry directly. Unknown ids read as absent.
impl ValueProvider for FieldRegistry {
    fn has_value(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    fn get_string(&self, id: &str) -> String {
        self.field_by_id(id)
            .map(|f| f.value.clone())
            .unwrap_or_default()
    }
}
