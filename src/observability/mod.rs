//! Observability subsystem for formflow
//!
//! Provides:
//! - Structured logging (JSON lines on stderr)
//! - Per-session counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on propagation
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use formflow::observability::{Event, Logger};
//!
//! Logger::warn(Event::ParameterUnknown, &[("field", "Anrede"), ("parameter", "Geschlecht")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{EngineMetrics, MetricsSnapshot};
