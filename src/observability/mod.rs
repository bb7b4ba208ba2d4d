//! Observability for docshape
//!
//! Structured JSON logging of lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on validation results
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use docshape::observability::{log_event, Event, Logger, Severity};
//!
//! log_event(Event::SchemasLoaded, &[("count", "3")]);
//! Logger::log(Severity::Warn, "CUSTOM_EVENT", &[("detail", "x")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
