//! Dependency Index
//!
//! Reverse maps from a field id to the fields and groups whose functions
//! read it, plus the map from function dialogs to the autofilled fields that
//! read them. Built once from the registry and never changed afterwards.
//!
//! Every field is listed as a plausibility dependent of its own id, so a
//! direct edit always rechecks the edited field.

use std::collections::{HashMap, HashSet, VecDeque};

use super::registry::FieldRegistry;
use crate::functions::FunctionRef;
use crate::observability::{Event, Logger};

/// Reverse dependency maps, values are registry slots
#[derive(Debug, Default)]
pub(crate) struct DependencyIndex {
    autofill: HashMap<String, Vec<usize>>,
    plausi: HashMap<String, Vec<usize>>,
    groups: HashMap<String, Vec<usize>>,
    dialogs: HashMap<String, Vec<usize>>,
}

fn push_unique(map: &mut HashMap<String, Vec<usize>>, key: &str, slot: usize) {
    let list = map.entry(key.to_string()).or_default();
    if !list.contains(&slot) {
        list.push(slot);
    }
}

fn warn_unknown_parameters(registry: &FieldRegistry, subject: &str, role: &str, f: &FunctionRef) {
    for parameter in f.parameters() {
        if registry.slot_of(parameter).is_none() {
            Logger::warn(
                Event::ParameterUnknown,
                &[("parameter", parameter), ("role", role), ("subject", subject)],
            );
        }
    }
}

impl DependencyIndex {
    pub fn build(registry: &FieldRegistry) -> Self {
        let mut index = DependencyIndex::default();

        for (slot, field) in registry.fields().iter().enumerate() {
            if let Some(autofill) = &field.autofill {
                warn_unknown_parameters(registry, &field.id, "autofill", autofill);
                for parameter in autofill.parameters() {
                    push_unique(&mut index.autofill, parameter, slot);
                }
                for dialog in autofill.dialog_references() {
                    push_unique(&mut index.dialogs, dialog, slot);
                }
            }

            if let Some(plausi) = &field.plausi {
                warn_unknown_parameters(registry, &field.id, "plausi", plausi);
                for parameter in plausi.parameters() {
                    push_unique(&mut index.plausi, parameter, slot);
                }
            }
            push_unique(&mut index.plausi, &field.id, slot);
        }

        for (slot, group) in registry.groups().iter().enumerate() {
            // Superseded rules keep their dependencies
            for rule in &group.rules {
                warn_unknown_parameters(registry, &group.id, "visibility", rule);
                for parameter in rule.parameters() {
                    push_unique(&mut index.groups, parameter, slot);
                }
            }
        }

        index
    }

    /// Fields whose autofill reads `id`
    pub fn autofill_dependents(&self, id: &str) -> &[usize] {
        self.autofill.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fields whose plausibility check reads `id`, including `id` itself
    pub fn plausi_dependents(&self, id: &str) -> &[usize] {
        self.plausi.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups whose visibility condition reads `id`
    pub fn group_dependents(&self, id: &str) -> &[usize] {
        self.groups.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Autofilled fields reading a function dialog, `None` if no field does
    pub fn dialog_dependents(&self, dialog: &str) -> Option<&[usize]> {
        self.dialogs.get(dialog).map(Vec::as_slice)
    }

    /// All fields transitively reachable from `seed` over autofill edges,
    /// seeds included. Each slot appears once, in breadth-first order.
    pub fn compute_closure<I>(&self, registry: &FieldRegistry, seed: I) -> Closure
    where
        I: IntoIterator<Item = usize>,
    {
        let mut closure = Closure::default();
        let mut todo: VecDeque<usize> = seed.into_iter().collect();

        while let Some(slot) = todo.pop_front() {
            if !closure.insert(slot) {
                continue;
            }
            for &dependent in self.autofill_dependents(&registry.field(slot).id) {
                if !closure.contains(dependent) {
                    todo.push_back(dependent);
                }
            }
        }

        closure
    }
}

/// Set of field slots affected by one change
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Closure {
    order: Vec<usize>,
    members: HashSet<usize>,
}

impl Closure {
    fn insert(&mut self, slot: usize) -> bool {
        if self.members.insert(slot) {
            self.order.push(slot);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.members.contains(&slot)
    }

    /// Slots in discovery order
    pub fn slots(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldDescriptor, GroupDescriptor};
    use crate::functions::{Expr, FunctionLibrary, MapDialogLibrary};
    use std::rc::Rc;

    fn copy_of(id: &str) -> FunctionRef {
        FunctionLibrary::new().resolve(&Expr::value(id)).unwrap()
    }

    #[test]
    fn test_every_field_rechecks_itself() {
        let registry = FieldRegistry::build(
            vec![
                FieldDescriptor::new("a"),
                FieldDescriptor::new("b").with_plausi(copy_of("a")),
            ],
            vec![],
        );
        let index = DependencyIndex::build(&registry);
        assert_eq!(index.plausi_dependents("a"), [0, 1]);
        assert_eq!(index.plausi_dependents("b"), [1]);
        assert!(index.plausi_dependents("c").is_empty());
    }

    #[test]
    fn test_closure_follows_chains() {
        let registry = FieldRegistry::build(
            vec![
                FieldDescriptor::new("a"),
                FieldDescriptor::new("b").with_autofill(copy_of("a")),
                FieldDescriptor::new("c").with_autofill(copy_of("b")),
                FieldDescriptor::new("d"),
            ],
            vec![],
        );
        let index = DependencyIndex::build(&registry);
        let closure = index.compute_closure(&registry, [0]);
        assert_eq!(closure.slots(), [0, 1, 2]);
        assert!(!closure.contains(3));
    }

    #[test]
    fn test_closure_terminates_on_cycles() {
        let registry = FieldRegistry::build(
            vec![
                FieldDescriptor::new("a").with_autofill(copy_of("c")),
                FieldDescriptor::new("b").with_autofill(copy_of("a")),
                FieldDescriptor::new("c").with_autofill(copy_of("b")),
            ],
            vec![],
        );
        let index = DependencyIndex::build(&registry);
        let closure = index.compute_closure(&registry, [1, 1]);
        assert_eq!(closure.len(), 3);
        assert_eq!(closure.slots()[0], 1);
    }

    #[test]
    fn test_group_and_dialog_dependents() {
        let dialogs = Rc::new(MapDialogLibrary::new(["AddressLookup"]));
        let library = FunctionLibrary::with_dialogs(dialogs);
        let street = library
            .resolve(&Expr::dialog("AddressLookup", "Strasse"))
            .unwrap();

        let registry = FieldRegistry::build(
            vec![
                FieldDescriptor::new("Firma"),
                FieldDescriptor::new("Strasse").with_autofill(street),
            ],
            vec![
                GroupDescriptor::new("Zusatz").with_condition(copy_of("Firma")),
                GroupDescriptor::new("Zusatz").with_condition(copy_of("Strasse")),
            ],
        );
        let index = DependencyIndex::build(&registry);
        assert_eq!(index.group_dependents("Firma"), [0]);
        assert_eq!(index.group_dependents("Strasse"), [0]);
        assert_eq!(index.dialog_dependents("AddressLookup"), Some(&[1][..]));
        assert_eq!(index.dialog_dependents("Other"), None);
    }
}
