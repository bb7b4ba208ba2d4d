//! Observable events
//!
//! Events are explicit and typed. Validation itself emits nothing; these
//! are raised by the registry and the CLI around it.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Registry
    /// Schema directory loaded
    SchemasLoaded,
    /// Schema directory reloaded
    SchemasReloaded,
    /// Schema registered programmatically
    SchemaRegistered,
    /// Schema descriptor failed to build
    SchemaRejected,

    // Validation
    /// Document satisfied its schema
    DocumentValidated,
    /// Document produced violations
    DocumentRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::SchemasReloaded => "SCHEMAS_RELOADED",
            Event::SchemaRegistered => "SCHEMA_REGISTERED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::DocumentValidated => "DOCUMENT_VALIDATED",
            Event::DocumentRejected => "DOCUMENT_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaRejected => Severity::Error,
            Event::DocumentRejected => Severity::Warn,
            Event::DocumentValidated => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
