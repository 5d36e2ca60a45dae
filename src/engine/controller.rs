//! Form Engine
//!
//! Owns the field registry, the dependency index and the reentrancy guard of
//! one form session.
//!
//! Entry points:
//! - `on_field_value_changed`: a direct edit of one field
//! - `set_value`: a programmatic edit, treated like a direct edit
//! - `on_function_dialog_result`: a function dialog delivered a selection
//!
//! Each entry point runs one guarded propagation. A call that arrives while
//! a run is in progress (from a sink callback or a function) is dropped, not
//! queued. No error escapes an entry point; evaluation failures are logged
//! and read as empty string or false.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use super::deps::DependencyIndex;
use super::registry::FieldRegistry;
use super::sink::ChangeSink;
use crate::form::{
    EngineConfig, FieldDescriptor, FormDefinition, FormError, FormResult, GroupDescriptor, Preset,
};
use crate::functions::FunctionLibrary;
use crate::observability::{EngineMetrics, Event, Logger, MetricsSnapshot};

/// Holds the processing flag for the duration of one guarded run
struct ProcessingGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> ProcessingGuard<'a> {
    /// Take the flag, or `None` if a run is already in progress
    fn try_acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// The reactive core of one form session
pub struct Engine {
    pub(super) session_id: Uuid,
    pub(super) registry: RefCell<FieldRegistry>,
    pub(super) deps: DependencyIndex,
    pub(super) sink: RefCell<Box<dyn ChangeSink>>,
    pub(super) processing: Cell<bool>,
    pub(super) metrics: EngineMetrics,
}

impl Engine {
    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Build the engine and establish the initial state.
    ///
    /// Order is fixed: autofills and presets first, then group visibility,
    /// then one plausibility check per field. Fields with a preset keep it
    /// and are not announced to the sink; every other field is.
    ///
    /// A configuration error is returned before the sink sees anything.
    pub fn initialize(
        fields: Vec<FieldDescriptor>,
        groups: Vec<GroupDescriptor>,
        presets: &BTreeMap<String, Preset>,
        sink: Box<dyn ChangeSink>,
        config: &EngineConfig,
    ) -> FormResult<Engine> {
        let session_id = Uuid::new_v4();
        let session = session_id.to_string();
        Logger::info(
            Event::FormInitBegin,
            &[
                ("fields", &fields.len().to_string()),
                ("groups", &groups.len().to_string()),
                ("session_id", &session),
            ],
        );

        let engine = Self::construct(session_id, fields, groups, sink, config)
            .map_err(|err| Self::init_failed(err, &session))?;

        {
            let _guard = ProcessingGuard::try_acquire(&engine.processing);
            engine.seed_values(presets, &config.needs_review_marker);
            engine.apply_initial_visibility();
            engine.check_all_plausis();
        }

        let registry = engine.registry.borrow();
        let invalid = registry.fields().iter().filter(|f| !f.okay).count();
        Logger::info(
            Event::FormInitComplete,
            &[
                ("fields", &registry.len().to_string()),
                ("groups", &registry.groups().len().to_string()),
                ("invalid", &invalid.to_string()),
                ("session_id", &session),
            ],
        );
        drop(registry);

        Ok(engine)
    }

    /// Resolve a loaded definition against `library` and initialize from it
    pub fn from_definition(
        definition: &FormDefinition,
        library: &FunctionLibrary,
        sink: Box<dyn ChangeSink>,
    ) -> FormResult<Engine> {
        let (fields, groups) = definition
            .resolve(library)
            .map_err(|err| Self::init_failed(err, "-"))?;
        let presets = definition.preset_overrides();
        Self::initialize(fields, groups, &presets, sink, &definition.engine)
    }

    fn construct(
        session_id: Uuid,
        fields: Vec<FieldDescriptor>,
        groups: Vec<GroupDescriptor>,
        sink: Box<dyn ChangeSink>,
        config: &EngineConfig,
    ) -> FormResult<Engine> {
        config.validate()?;

        let registry = FieldRegistry::build(fields, groups);
        check_autofill_order(&registry, config.strict_autofill_order)?;
        let deps = DependencyIndex::build(&registry);

        Ok(Engine {
            session_id,
            registry: RefCell::new(registry),
            deps,
            sink: RefCell::new(sink),
            processing: Cell::new(false),
            metrics: EngineMetrics::new(),
        })
    }

    fn init_failed(err: FormError, session: &str) -> FormError {
        Logger::fatal(
            Event::FormInitFailed,
            &[
                ("code", err.code().code()),
                ("message", err.message()),
                ("session_id", session),
            ],
        );
        err
    }

    fn seed_values(&self, presets: &BTreeMap<String, Preset>, marker: &str) {
        for id in presets.keys() {
            if self.registry.borrow().slot_of(id).is_none() {
                Logger::warn(Event::FieldUnknown, &[("context", "preset"), ("field", id)]);
            }
        }

        let count = self.registry.borrow().len();
        for slot in 0..count {
            let (id, autofill) = {
                let registry = self.registry.borrow();
                let field = registry.field(slot);
                (field.id.clone(), field.autofill.clone())
            };

            match presets.get(&id) {
                Some(Preset::Value(value)) => {
                    self.registry.borrow_mut().field_mut(slot).value = value.clone();
                }
                Some(Preset::NeedsReview) => {
                    let mut registry = self.registry.borrow_mut();
                    let field = registry.field_mut(slot);
                    field.value = marker.to_string();
                    field.fishy = true;
                }
                None => {
                    if let Some(autofill) = autofill {
                        let value = self.evaluate_string(&autofill, &id, "autofill");
                        self.registry.borrow_mut().field_mut(slot).value = value;
                    }
                    self.notify_value(slot);
                }
            }
        }
    }

    fn check_all_plausis(&self) {
        let count = self.registry.borrow().len();
        for slot in 0..count {
            self.check_plausi(slot);
        }
    }

    // =========================================================================
    // ENTRY POINTS
    // =========================================================================

    /// Take the processing flag, or log and count a dropped call
    fn enter(&self, entry: &str) -> Option<ProcessingGuard<'_>> {
        let guard = ProcessingGuard::try_acquire(&self.processing);
        if guard.is_none() {
            self.metrics.increment_reentrant_drops();
            Logger::trace(
                Event::ReentrantCallDropped,
                &[("entry", entry), ("session_id", &self.session_id.to_string())],
            );
        }
        guard
    }

    /// A field was edited directly.
    ///
    /// The new value is stored and announced, the field stops being fishy,
    /// and every field reachable over autofill edges is recomputed, then
    /// rechecked, then its dependent groups reevaluated. Unknown ids are
    /// logged and ignored.
    pub fn on_field_value_changed(&self, id: &str, value: &str) {
        let _guard = match self.enter("on_field_value_changed") {
            Some(guard) => guard,
            None => return,
        };

        let slot = self.registry.borrow().slot_of(id);
        match slot {
            Some(slot) => self.apply_edit(slot, value),
            None => {
                let err = FormError::unknown_field(id);
                Logger::warn(
                    Event::FieldUnknown,
                    &[
                        ("code", err.code().code()),
                        ("field", id),
                        ("message", err.message()),
                    ],
                );
            }
        }
    }

    /// Programmatic edit, handled exactly like a direct edit. A value for an
    /// id the form does not know goes straight to the sink.
    pub fn set_value(&self, id: &str, value: &str) {
        let _guard = match self.enter("set_value") {
            Some(guard) => guard,
            None => return,
        };

        let slot = self.registry.borrow().slot_of(id);
        match slot {
            Some(slot) => self.apply_edit(slot, value),
            None => {
                self.sink.borrow_mut().on_value_changed(id, value);
                self.metrics.increment_value_notifications();
            }
        }
    }

    /// A function dialog delivered a new selection.
    ///
    /// Every field whose autofill reads the dialog is recomputed, with
    /// everything depending on those fields.
    pub fn on_function_dialog_result(&self, dialog: &str) {
        let _guard = match self.enter("on_function_dialog_result") {
            Some(guard) => guard,
            None => return,
        };

        let seed: Vec<usize> = match self.deps.dialog_dependents(dialog) {
            Some(slots) => slots.to_vec(),
            None => {
                Logger::warn(Event::DialogUnknown, &[("dialog", dialog)]);
                Vec::new()
            }
        };

        let closure = self.deps.compute_closure(&self.registry.borrow(), seed);
        self.propagate(&closure, None, dialog);
    }

    fn apply_edit(&self, slot: usize, value: &str) {
        {
            let mut registry = self.registry.borrow_mut();
            let field = registry.field_mut(slot);
            field.value = value.to_string();
            field.fishy = false;
        }
        self.notify_value(slot);

        let closure = self.deps.compute_closure(&self.registry.borrow(), [slot]);
        let trigger = self.registry.borrow().field(slot).id.clone();
        self.propagate(&closure, Some(slot), &trigger);
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Whether no visible field is not okay
    pub fn is_input_okay(&self) -> bool {
        self.registry
            .borrow()
            .fields()
            .iter()
            .all(|f| f.okay || !f.visible)
    }

    /// Visible fields that are not okay, in declaration order
    pub fn invalid_fields(&self) -> Vec<String> {
        self.registry
            .borrow()
            .fields()
            .iter()
            .filter(|f| f.visible && !f.okay)
            .map(|f| f.id.clone())
            .collect()
    }

    pub fn value(&self, id: &str) -> Option<String> {
        self.registry.borrow().field_by_id(id).map(|f| f.value.clone())
    }

    pub fn is_okay(&self, id: &str) -> Option<bool> {
        self.registry.borrow().field_by_id(id).map(|f| f.okay)
    }

    pub fn is_fishy(&self, id: &str) -> Option<bool> {
        self.registry.borrow().field_by_id(id).map(|f| f.fishy)
    }

    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.registry.borrow().field_by_id(id).map(|f| f.visible)
    }

    pub fn is_group_visible(&self, id: &str) -> Option<bool> {
        let registry = self.registry.borrow();
        registry
            .group_slot_of(id)
            .map(|slot| registry.group(slot).visible)
    }

    /// Field ids in declaration order, duplicates included
    pub fn field_ids(&self) -> Vec<String> {
        self.registry
            .borrow()
            .fields()
            .iter()
            .map(|f| f.id.clone())
            .collect()
    }

    /// Group ids in order of first mention
    pub fn group_ids(&self) -> Vec<String> {
        self.registry
            .borrow()
            .groups()
            .iter()
            .map(|g| g.id.clone())
            .collect()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Autofills run in declaration order, so each should only read fields
/// declared before it.
fn check_autofill_order(registry: &FieldRegistry, strict: bool) -> FormResult<()> {
    for (slot, field) in registry.fields().iter().enumerate() {
        let autofill = match &field.autofill {
            Some(autofill) => autofill,
            None => continue,
        };
        for parameter in autofill.parameters() {
            match registry.slot_of(parameter) {
                Some(source) if source >= slot => {
                    if strict {
                        return Err(FormError::autofill_order(&field.id, parameter));
                    }
                    Logger::warn(
                        Event::AutofillOrderViolation,
                        &[("field", &field.id), ("parameter", parameter)],
                    );
                }
                _ => {}
            }
        }
    }
    Ok(())
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("session_id", &self.session_id)
            .field("fields", &self.field_ids())
            .field("processing", &self.processing.get())
            .finish_non_exhaustive()
    }
}
