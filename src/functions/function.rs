//! # Function Contract
//!
//! Everything the engine needs from a resolved function: its declared
//! parameters, the dialogs it reads, and string/boolean evaluation.

use std::fmt;
use std::rc::Rc;

use super::errors::FunctionResult;
use super::provider::{is_true, ValueProvider};

/// A resolved, side-effect-free function over field values.
pub trait Function {
    /// Field ids this function reads. Sorted, no duplicates.
    fn parameters(&self) -> &[String];

    /// Function dialogs this function reads. Sorted, no duplicates.
    fn dialog_references(&self) -> &[String];

    /// Evaluate to a string
    fn evaluate_string(&self, values: &dyn ValueProvider) -> FunctionResult<String>;

    /// Evaluate to a boolean
    fn evaluate_bool(&self, values: &dyn ValueProvider) -> FunctionResult<bool> {
        self.evaluate_string(values).map(|s| is_true(&s))
    }
}

/// Shared handle to a resolved function
pub type FunctionRef = Rc<dyn Function>;

type Body = Box<dyn Fn(&dyn ValueProvider) -> FunctionResult<String>>;

/// A function backed by a host closure.
///
/// Used for external or stateful predicates that the expression language
/// cannot express.
pub struct FnFunction {
    params: Vec<String>,
    dialogs: Vec<String>,
    body: Body,
}

impl FnFunction {
    /// A string-valued function reading `params`
    pub fn new<I, S, F>(params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&dyn ValueProvider) -> FunctionResult<String> + 'static,
    {
        Self {
            params: sorted_unique(params),
            dialogs: Vec::new(),
            body: Box::new(body),
        }
    }

    /// A boolean-valued function reading `params`
    pub fn predicate<I, S, F>(params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&dyn ValueProvider) -> FunctionResult<bool> + 'static,
    {
        Self::new(params, move |values| {
            body(values).map(|b| super::provider::bool_str(b).to_string())
        })
    }

    /// Declare the dialogs this function reads
    pub fn with_dialogs<I, S>(mut self, dialogs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dialogs = sorted_unique(dialogs);
        self
    }

    pub fn into_ref(self) -> FunctionRef {
        Rc::new(self)
    }
}

impl Function for FnFunction {
    fn parameters(&self) -> &[String] {
        &self.params
    }

    fn dialog_references(&self) -> &[String] {
        &self.dialogs
    }

    fn evaluate_string(&self, values: &dyn ValueProvider) -> FunctionResult<String> {
        (self.body)(values)
    }
}

impl fmt::Debug for FnFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFunction")
            .field("params", &self.params)
            .field("dialogs", &self.dialogs)
            .finish_non_exhaustive()
    }
}

pub(crate) fn sorted_unique<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = items.into_iter().map(Into::into).collect();
    out.sort();
    out.dedup();
    out
}
