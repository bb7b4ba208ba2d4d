//! Schema error types
//!
//! Error codes:
//! - DOCSHAPE_EMPTY_SCHEMA_NAME ... DOCSHAPE_UNSUPPORTED_KEYWORD (build time)
//! - DOCSHAPE_UNKNOWN_SCHEMA (REJECT)
//! - DOCSHAPE_SCHEMA_ALREADY_REGISTERED (REJECT)
//! - DOCSHAPE_MALFORMED_SCHEMA (FATAL at startup)
//!
//! Document problems are never errors; they are reported as violations.

use thiserror::Error;

/// Result type for schema registry operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A schema description that is contradictory or structurally invalid.
///
/// Raised only while building a schema. Indicates a configuration bug,
/// never a runtime condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaDefinitionError {
    #[error("schema name must not be empty")]
    EmptySchemaName,

    #[error("field name must not be empty (in '{path}')")]
    EmptyFieldName { path: String },

    #[error("field '{path}' is declared more than once")]
    DuplicateField { path: String },

    #[error("field '{path}' is listed as required more than once")]
    DuplicateRequiredField { path: String },

    /// `min > max`, or a NaN bound
    #[error("invalid range on '{path}': [{min}, {max}]")]
    InvalidRange { path: String, min: f64, max: f64 },

    /// No value could satisfy every constraint on the field
    #[error("conflicting constraints on '{path}': {reason}")]
    ConflictingConstraints { path: String, reason: String },

    // ==================
    // Descriptor Errors
    // ==================
    #[error("invalid descriptor at '{path}': {reason}")]
    InvalidDescriptor { path: String, reason: String },

    #[error("unknown value kind '{kind}' at '{path}'")]
    UnknownValueKind { path: String, kind: String },

    /// Keyword outside the supported vocabulary (e.g. `pattern`)
    #[error("unsupported keyword '{keyword}' at '{path}'")]
    UnsupportedKeyword { path: String, keyword: String },
}

impl SchemaDefinitionError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptySchemaName => "DOCSHAPE_EMPTY_SCHEMA_NAME",
            Self::EmptyFieldName { .. } => "DOCSHAPE_EMPTY_FIELD_NAME",
            Self::DuplicateField { .. } => "DOCSHAPE_DUPLICATE_FIELD",
            Self::DuplicateRequiredField { .. } => "DOCSHAPE_DUPLICATE_REQUIRED_FIELD",
            Self::InvalidRange { .. } => "DOCSHAPE_INVALID_RANGE",
            Self::ConflictingConstraints { .. } => "DOCSHAPE_CONFLICTING_CONSTRAINTS",
            Self::InvalidDescriptor { .. } => "DOCSHAPE_INVALID_DESCRIPTOR",
            Self::UnknownValueKind { .. } => "DOCSHAPE_UNKNOWN_VALUE_KIND",
            Self::UnsupportedKeyword { .. } => "DOCSHAPE_UNSUPPORTED_KEYWORD",
        }
    }

    /// Returns the schema path the error refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::EmptySchemaName => None,
            Self::EmptyFieldName { path }
            | Self::DuplicateField { path }
            | Self::DuplicateRequiredField { path }
            | Self::InvalidRange { path, .. }
            | Self::ConflictingConstraints { path, .. }
            | Self::InvalidDescriptor { path, .. }
            | Self::UnknownValueKind { path, .. }
            | Self::UnsupportedKeyword { path, .. } => Some(path),
        }
    }
}

/// Errors raised by the schema registry
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema '{0}' not found")]
    UnknownSchema(String),

    /// Registered schemas are immutable; a name can only be bound once
    #[error("schema '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("malformed schema file '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("invalid schema in '{path}': {source}")]
    Definition {
        path: String,
        #[source]
        source: SchemaDefinitionError,
    },
}

impl SchemaError {
    /// Returns the stable error code. Definition errors keep the code of
    /// the underlying build failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownSchema(_) => "DOCSHAPE_UNKNOWN_SCHEMA",
            Self::AlreadyRegistered(_) => "DOCSHAPE_SCHEMA_ALREADY_REGISTERED",
            Self::Malformed { .. } => "DOCSHAPE_MALFORMED_SCHEMA",
            Self::Definition { source, .. } => source.code(),
        }
    }

    /// Load failures abort startup; lookups and registrations are rejected
    /// individually.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::Definition { .. })
    }

    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
