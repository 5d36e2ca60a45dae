//! Propagation passes
//!
//! One guarded run is: autofill pass, plausibility pass, visibility pass,
//! each over the same closure. Registry borrows never span a sink
//! notification.

use super::controller::Engine;
use super::deps::Closure;
use crate::functions::{FunctionError, FunctionRef};
use crate::observability::{Event, Logger};

impl Engine {
    pub(super) fn propagate(&self, closure: &Closure, except: Option<usize>, trigger: &str) {
        self.recompute_autofills(closure, except);
        self.recheck_plausis(closure);
        self.recheck_visibility_groups(closure);

        self.metrics.increment_propagation_runs();
        Logger::trace(
            Event::PropagationComplete,
            &[
                ("closure", &closure.len().to_string()),
                ("session_id", &self.session_id.to_string()),
                ("trigger", trigger),
            ],
        );
    }

    /// Recompute every autofilled field in the closure except `except`.
    ///
    /// All fields are visited in declaration order, so a field reading an
    /// earlier autofilled field sees the fresh value.
    fn recompute_autofills(&self, closure: &Closure, except: Option<usize>) {
        let count = self.registry.borrow().len();
        for slot in 0..count {
            if except == Some(slot) || !closure.contains(slot) {
                continue;
            }

            let (id, autofill) = {
                let registry = self.registry.borrow();
                let field = registry.field(slot);
                (field.id.clone(), field.autofill.clone())
            };
            let autofill = match autofill {
                Some(autofill) => autofill,
                None => continue,
            };

            let value = self.evaluate_string(&autofill, &id, "autofill");
            {
                let mut registry = self.registry.borrow_mut();
                let field = registry.field_mut(slot);
                field.value = value;
                field.fishy = false;
            }
            self.notify_value(slot);
        }
    }

    fn recheck_plausis(&self, closure: &Closure) {
        for &slot in closure.slots() {
            let id = self.registry.borrow().field(slot).id.clone();
            for &dependent in self.deps.plausi_dependents(&id) {
                self.check_plausi(dependent);
            }
        }
    }

    /// Recompute `okay` for one field; a fishy field is never okay.
    pub(super) fn check_plausi(&self, slot: usize) {
        let (id, fishy, plausi, okay) = {
            let registry = self.registry.borrow();
            let field = registry.field(slot);
            (field.id.clone(), field.fishy, field.plausi.clone(), field.okay)
        };

        let new_okay = !fishy
            && match plausi {
                Some(plausi) => self.evaluate_bool(&plausi, &id, "plausi"),
                None => true,
            };
        if new_okay == okay {
            return;
        }

        self.registry.borrow_mut().field_mut(slot).okay = new_okay;
        self.sink.borrow_mut().on_validity_changed(&id, new_okay);
        self.metrics.increment_validity_notifications();
    }

    // =========================================================================
    // EVALUATION
    // =========================================================================

    pub(super) fn evaluate_string(&self, function: &FunctionRef, subject: &str, role: &str) -> String {
        let result = function.evaluate_string(&*self.registry.borrow());
        result.unwrap_or_else(|err| {
            self.evaluation_failed(subject, role, &err);
            String::new()
        })
    }

    pub(super) fn evaluate_bool(&self, function: &FunctionRef, subject: &str, role: &str) -> bool {
        let result = function.evaluate_bool(&*self.registry.borrow());
        result.unwrap_or_else(|err| {
            self.evaluation_failed(subject, role, &err);
            false
        })
    }

    fn evaluation_failed(&self, subject: &str, role: &str, err: &FunctionError) {
        self.metrics.increment_evaluation_failures();
        Logger::error(
            Event::EvaluationFailed,
            &[
                ("code", err.code()),
                ("error", &err.to_string()),
                ("role", role),
                ("subject", subject),
            ],
        );
    }

    // =========================================================================
    // NOTIFICATION
    // =========================================================================

    pub(super) fn notify_value(&self, slot: usize) {
        let (id, value) = {
            let registry = self.registry.borrow();
            let field = registry.field(slot);
            (field.id.clone(), field.value.clone())
        };
        self.sink.borrow_mut().on_value_changed(&id, &value);
        self.metrics.increment_value_notifications();
    }

    pub(super) fn notify_visibility(&self, id: &str, visible: bool) {
        self.sink.borrow_mut().on_visibility_changed(id, visible);
        self.metrics.increment_visibility_notifications();
    }
}
