//! Observability for the execution runtime
//!
//! - Structured JSON logging (`Logger`)
//! - Typed lifecycle events (`Event`)
//! - Atomic execution counters (`MetricsRegistry`)
//! - Begin/complete scopes around sort phases (`ObservationScope`)
//!
//! Observability is read-only with respect to execution: nothing here can
//! fail a statement, and nothing here changes what a cursor returns.
//!
//! ```ignore
//! use groupqp::observability::{log_event, Event};
//!
//! log_event(Event::SpillRunWritten, &[("run", "3"), ("rows", "65536")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a typed event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
