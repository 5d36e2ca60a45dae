//! Visibility groups
//!
//! A group is visible or hidden as a whole. Changing a group writes its
//! state straight into every member field. A field in several groups simply
//! carries the state of the group that changed last; memberships are not
//! combined.

use super::controller::Engine;
use super::deps::Closure;

impl Engine {
    /// Evaluate every conditional group once; groups start visible.
    pub(super) fn apply_initial_visibility(&self) {
        let count = self.registry.borrow().groups().len();
        for group in 0..count {
            self.recheck_group(group);
        }
    }

    pub(super) fn recheck_visibility_groups(&self, closure: &Closure) {
        for &slot in closure.slots() {
            let id = self.registry.borrow().field(slot).id.clone();
            for &group in self.deps.group_dependents(&id) {
                self.recheck_group(group);
            }
        }
    }

    fn recheck_group(&self, group: usize) {
        let (id, condition, visible) = {
            let registry = self.registry.borrow();
            let state = registry.group(group);
            (state.id.clone(), state.condition().cloned(), state.visible)
        };
        let condition = match condition {
            Some(condition) => condition,
            None => return,
        };

        let result = self.evaluate_bool(&condition, &id, "visibility");
        if result != visible {
            self.set_group_visibility(group, result);
        }
    }

    /// Show or hide a group and every member whose state differs.
    ///
    /// Members are announced one by one, then the group itself once.
    pub(super) fn set_group_visibility(&self, group: usize, visible: bool) {
        let (group_id, members) = {
            let mut registry = self.registry.borrow_mut();
            let state = registry.group_mut(group);
            state.visible = visible;
            (state.id.clone(), state.members.clone())
        };

        for member in members {
            let changed = {
                let mut registry = self.registry.borrow_mut();
                let field = registry.field_mut(member);
                if field.visible == visible {
                    None
                } else {
                    field.visible = visible;
                    Some(field.id.clone())
                }
            };
            if let Some(id) = changed {
                self.notify_visibility(&id, visible);
            }
        }

        self.notify_visibility(&group_id, visible);
    }
}
