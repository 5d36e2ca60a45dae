//! formflow - reactive field dependencies for interactive forms
//!
//! Fields can be computed from one another (autofill), validated against
//! each other (plausibility checks) and grouped into sections that appear
//! and disappear with other fields' values. The engine keeps all of this
//! consistent after every edit.

pub mod cli;
pub mod engine;
pub mod form;
pub mod functions;
pub mod observability;
