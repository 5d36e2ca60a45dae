//! Form definitions for formflow
//!
//! A form definition declares fields (with optional autofill and
//! plausibility functions and group memberships), visibility groups, preset
//! overrides and the engine configuration.
//!
//! # Design Principles
//!
//! - Definitions are loaded and validated once, before the engine is built
//! - Functions are resolved up front; a form with an unresolvable function
//!   is rejected as a whole
//! - Declaration order is significant (autofills run in declaration order)

mod config;
mod errors;
mod loader;
mod types;

pub use config::{EngineConfig, DEFAULT_NEEDS_REVIEW_MARKER};
pub use errors::{FormError, FormErrorCode, FormResult, Severity};
pub use loader::FormLoader;
pub use types::{FieldDescriptor, FieldSpec, FormDefinition, GroupDescriptor, GroupSpec, Preset};
