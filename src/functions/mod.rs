//! # Function Library
//!
//! Functions compute autofill values, plausibility verdicts and visibility
//! conditions from the current field values. They are resolved once, when a
//! form is built, and are assumed to be free of side effects.

pub mod dialog;
pub mod errors;
pub mod expr;
pub mod function;
pub mod number;
pub mod provider;
pub mod registry;

pub use dialog::{DialogLibrary, MapDialogLibrary, OnSelect};
pub use errors::{FunctionError, FunctionResult};
pub use expr::{Compare, Expr};
pub use function::{FnFunction, Function, FunctionRef};
pub use provider::{bool_str, is_true, MapValues, ValueProvider};
pub use registry::FunctionLibrary;
