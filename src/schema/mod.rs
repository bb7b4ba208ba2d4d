//! Document-shape schemas and the validation engine
//!
//! A schema is built once from static configuration and then shared
//! read-only by every validation call.
//!
//! # Design Principles
//!
//! - Schema errors are caught at build time, never during validation
//! - Validation is total: bad documents yield violations, not errors
//! - Every violation is reported with its full path
//! - Unknown fields are allowed unless a schema opts into strict mode
//! - No I/O or shared mutable state in the engine

pub mod descriptor;
mod errors;
mod registry;
mod report;
mod types;
mod validator;

pub use descriptor::{build, build_named};
pub use errors::{SchemaDefinitionError, SchemaError, SchemaResult};
pub use registry::{load_schema_file, SchemaRegistry};
pub use report::{FieldPath, PathSegment, ValidationReport, Violation, ViolationKind};
pub use types::{observed_type_name, Constraint, FieldSpec, Schema, SchemaBuilder, ValueKind};
pub use validator::{validate, validate_partial, validate_with, SchemaValidator, ValidationMode};
