//! Observability events for formflow
//!
//! Every log line names one of these events. Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Form definition loaded from disk
    FormLoaded,
    /// Engine construction begins
    FormInitBegin,
    /// Engine construction complete, ready for edits
    FormInitComplete,
    /// Engine construction rejected
    FormInitFailed,

    // Construction diagnostics
    /// Two fields share an id
    FieldDuplicateId,
    /// A function refers to a field id that is not registered
    ParameterUnknown,
    /// Two visibility rules were given for one group
    GroupRuleDuplicate,
    /// An autofill reads a field declared after it
    AutofillOrderViolation,

    // Propagation
    /// A guarded run completed
    PropagationComplete,
    /// A call arrived while a run was in progress
    ReentrantCallDropped,
    /// A function failed during evaluation
    EvaluationFailed,
    /// An edit named a field that is not registered
    FieldUnknown,
    /// A dialog result named a dialog no autofill references
    DialogUnknown,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::FormLoaded => "FORM_LOADED",
            Event::FormInitBegin => "FORM_INIT_BEGIN",
            Event::FormInitComplete => "FORM_INIT_COMPLETE",
            Event::FormInitFailed => "FORM_INIT_FAILED",

            Event::FieldDuplicateId => "FIELD_DUPLICATE_ID",
            Event::ParameterUnknown => "PARAMETER_UNKNOWN",
            Event::GroupRuleDuplicate => "GROUP_RULE_DUPLICATE",
            Event::AutofillOrderViolation => "AUTOFILL_ORDER_VIOLATION",

            Event::PropagationComplete => "PROPAGATION_COMPLETE",
            Event::ReentrantCallDropped => "REENTRANT_CALL_DROPPED",
            Event::EvaluationFailed => "EVALUATION_FAILED",
            Event::FieldUnknown => "FIELD_UNKNOWN",
            Event::DialogUnknown => "DIALOG_UNKNOWN",
        }
    }

    /// Returns true if this event leaves the form session unusable
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::FormInitFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
