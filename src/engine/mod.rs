//! Reactive propagation engine for formflow
//!
//! Given a change to one field, the engine determines which other fields
//! must be recomputed, recomputes them in declaration order, rechecks the
//! plausibility of dependents and reevaluates visibility groups. Every state
//! change is reported to a `ChangeSink`.
//!
//! # Design Principles
//!
//! - One engine per form session, owned by one thread
//! - The dependency index is built once and never changes
//! - Calls arriving during a run are dropped, not queued
//! - Evaluation failures never escape; they read as empty or false

mod controller;
mod deps;
mod propagation;
mod registry;
mod sink;
mod visibility;
mod widget;

pub use controller::Engine;
pub use sink::{ChangeEvent, ChangeSink, NullSink, RecordingSink};
pub use widget::{TextWidget, Widget, WidgetSink};
