//! Validation report types
//!
//! A report lists every violation found in one document, each carrying
//! enough structure (path, kind, message) for a caller to render
//! field-level errors without re-deriving them.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

use super::types::observed_type_name;

/// One step into a document: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Location of a value within a nested document.
///
/// Serializes as a plain array, e.g. `["reviews", 0, "rating"]`, and
/// displays as `reviews[0].rating`. The empty path is the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a new path extended by an object key
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.to_string()));
        Self(segments)
    }

    /// Returns a new path extended by an array index
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$root");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Kind of constraint failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// Required field absent or null
    MissingRequiredField,
    /// Value has the wrong runtime type
    TypeMismatch,
    /// Numeric value outside its inclusive range
    OutOfRange,
    /// Field not declared by a strict schema
    UnknownField,
}

impl ViolationKind {
    /// Returns the stable code, identical to the serialized form
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ViolationKind::TypeMismatch => "TYPE_MISMATCH",
            ViolationKind::OutOfRange => "OUT_OF_RANGE",
            ViolationKind::UnknownField => "UNKNOWN_FIELD",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single constraint failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Location of the offending value
    pub path: FieldPath,
    pub kind: ViolationKind,
    /// Human-readable reason
    pub message: String,
}

impl Violation {
    pub fn new(path: FieldPath, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    pub fn missing_field(path: FieldPath) -> Self {
        Self::new(path, ViolationKind::MissingRequiredField, "required field is missing")
    }

    pub fn null_field(path: FieldPath) -> Self {
        Self::new(path, ViolationKind::MissingRequiredField, "required field is null")
    }

    pub fn type_mismatch(path: FieldPath, expected: &str, actual: &Value) -> Self {
        Self::new(
            path,
            ViolationKind::TypeMismatch,
            format!("expected {}, got {}", expected, observed_type_name(actual)),
        )
    }

    /// `value` must lie outside `[min, max]`
    pub fn out_of_range(path: FieldPath, value: &Number, min: f64, max: f64) -> Self {
        let message = match value.as_f64() {
            Some(v) if v < min => format!("value {} is below the minimum {}", value, min),
            _ => format!("value {} is above the maximum {}", value, max),
        };
        Self::new(path, ViolationKind::OutOfRange, message)
    }

    pub fn unknown_field(path: FieldPath, schema_name: &str) -> Self {
        Self::new(
            path,
            ViolationKind::UnknownField,
            format!("field is not declared by schema '{}'", schema_name),
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.kind)
    }
}

/// Complete, ordered outcome of validating one document.
///
/// `ok` is derived from the violation list and cannot disagree with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    ok: bool,
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// A report with no violations
    pub fn valid() -> Self {
        Self {
            ok: true,
            violations: Vec::new(),
        }
    }

    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            ok: violations.is_empty(),
            violations,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    /// Number of violations of the given kind
    pub fn count_of(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    /// Appends another report's violations after this one's
    pub fn merge(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
        self.ok = self.violations.is_empty();
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::valid()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ok {
            return f.write_str("valid");
        }
        write!(f, "{} violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  {}", violation)?;
        }
        Ok(())
    }
}
