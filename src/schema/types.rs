//! Schema model for document-shape contracts
//!
//! Supported constraint vocabulary:
//! - scalar type check (string, integer, number, boolean, object, array)
//! - inclusive numeric range
//! - array whose items all have one value kind
//! - array whose items are subdocuments checked against a nested schema
//!
//! Schemas are immutable once built. The only way to obtain one is
//! `SchemaBuilder::build`, which rejects contradictory definitions up front.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::errors::SchemaDefinitionError;

/// Runtime value kinds a field or array item can be required to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// UTF-8 string
    String,
    /// Integral JSON number
    Integer,
    /// Any JSON number, integral or not
    Number,
    /// Boolean
    Boolean,
    /// Nested object (shape unchecked)
    Object,
    /// Array (items unchecked)
    Array,
}

impl ValueKind {
    /// Returns the kind name used in descriptors and messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
        }
    }

    /// Parses a kind name, accepting the document-store aliases
    /// (`int`, `long`, `bool`, `double`, `decimal`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ValueKind::String),
            "integer" | "int" | "long" => Some(ValueKind::Integer),
            "number" | "double" | "decimal" => Some(ValueKind::Number),
            "boolean" | "bool" => Some(ValueKind::Boolean),
            "object" => Some(ValueKind::Object),
            "array" => Some(ValueKind::Array),
            _ => None,
        }
    }

    /// Returns true if `value` has this kind. `Number` accepts integers.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Number => value.is_number(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Object => value.is_object(),
            ValueKind::Array => value.is_array(),
        }
    }

    fn accepted(&self) -> TypeSet {
        match self {
            ValueKind::String => TypeSet::STRING,
            ValueKind::Integer => TypeSet::INTEGER,
            ValueKind::Number => TypeSet::NUMERIC,
            ValueKind::Boolean => TypeSet::BOOLEAN,
            ValueKind::Object => TypeSet::OBJECT,
            ValueKind::Array => TypeSet::ARRAY,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Name of the runtime type of a document value, as used in messages.
pub fn observed_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Set of runtime types, used only for build-time consistency checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TypeSet(u8);

impl TypeSet {
    const BOOLEAN: TypeSet = TypeSet(1);
    const INTEGER: TypeSet = TypeSet(1 << 1);
    const FRACTIONAL: TypeSet = TypeSet(1 << 2);
    const STRING: TypeSet = TypeSet(1 << 3);
    const ARRAY: TypeSet = TypeSet(1 << 4);
    const OBJECT: TypeSet = TypeSet(1 << 5);
    const NUMERIC: TypeSet = TypeSet(Self::INTEGER.0 | Self::FRACTIONAL.0);
    const ANY: TypeSet = TypeSet(0b11_1111);

    fn intersect(self, other: TypeSet) -> TypeSet {
        TypeSet(self.0 & other.0)
    }

    fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// One checkable rule attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "constraint", rename_all = "snake_case")]
pub enum Constraint {
    /// Value must have the given kind
    ScalarType { kind: ValueKind },
    /// Value must be numeric and within `[min, max]`, both ends inclusive.
    /// An open side is an infinite bound.
    NumericRange {
        #[serde(skip_serializing_if = "is_open_bound")]
        min: f64,
        #[serde(skip_serializing_if = "is_open_bound")]
        max: f64,
    },
    /// Value must be an array whose items all have `item_kind`
    ArrayOfScalar { item_kind: ValueKind },
    /// Value must be an array whose items each satisfy `item_schema`
    ArrayOfSubdocument { item_schema: Box<Schema> },
}

fn is_open_bound(bound: &f64) -> bool {
    bound.is_infinite()
}

impl Constraint {
    pub fn scalar(kind: ValueKind) -> Self {
        Constraint::ScalarType { kind }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Constraint::NumericRange { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Constraint::NumericRange {
            min,
            max: f64::INFINITY,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Constraint::NumericRange {
            min: f64::NEG_INFINITY,
            max,
        }
    }

    pub fn array_of(item_kind: ValueKind) -> Self {
        Constraint::ArrayOfScalar { item_kind }
    }

    pub fn array_of_subdocuments(item_schema: Schema) -> Self {
        Constraint::ArrayOfSubdocument {
            item_schema: Box::new(item_schema),
        }
    }

    /// Runtime types of the field value this constraint can accept
    fn accepted(&self) -> TypeSet {
        match self {
            Constraint::ScalarType { kind } => kind.accepted(),
            Constraint::NumericRange { .. } => TypeSet::NUMERIC,
            Constraint::ArrayOfScalar { .. } | Constraint::ArrayOfSubdocument { .. } => {
                TypeSet::ARRAY
            }
        }
    }

    /// Runtime types of array items this constraint can accept, if it
    /// constrains items at all
    fn accepted_items(&self) -> Option<TypeSet> {
        match self {
            Constraint::ArrayOfScalar { item_kind } => Some(item_kind.accepted()),
            Constraint::ArrayOfSubdocument { .. } => Some(TypeSet::OBJECT),
            _ => None,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::ScalarType { kind } => write!(f, "{}", kind),
            Constraint::NumericRange { min, max } => write!(f, "range [{}, {}]", min, max),
            Constraint::ArrayOfScalar { item_kind } => write!(f, "array<{}>", item_kind),
            Constraint::ArrayOfSubdocument { item_schema } => {
                write!(f, "array<{}>", item_schema.name())
            }
        }
    }
}

/// A field and the constraints attached to it, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    name: String,
    constraints: Vec<Constraint>,
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// An immutable document-shape contract.
///
/// Built once and then shared read-only across any number of validation
/// calls, including concurrent ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    name: String,
    required: Vec<String>,
    fields: Vec<FieldSpec>,
    strict: bool,
}

impl Schema {
    /// Starts a builder for a schema with the given name
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required field names, in declaration order
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Constrained fields, in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether undeclared document fields are violations
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Returns true if `name` is constrained or required by this schema
    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some() || self.required.iter().any(|r| r == name)
    }
}

/// Declarative builder for [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    name: String,
    required: Vec<String>,
    fields: Vec<FieldSpec>,
    strict: bool,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Marks one field as required
    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required.push(field.into());
        self
    }

    /// Marks several fields as required
    pub fn required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Declares a field with its constraints. An empty list leaves the
    /// field unconstrained in type.
    pub fn field<I>(mut self, name: impl Into<String>, constraints: I) -> Self
    where
        I: IntoIterator<Item = Constraint>,
    {
        self.fields.push(FieldSpec {
            name: name.into(),
            constraints: constraints.into_iter().collect(),
        });
        self
    }

    /// Rejects undeclared fields when set
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Checks the definition and produces the immutable schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaDefinitionError` if:
    /// - the schema or a field name is empty
    /// - a field is declared or required twice
    /// - a range has `min > max` or a NaN bound
    /// - the constraints on one field cannot all hold at once
    pub fn build(self) -> Result<Schema, SchemaDefinitionError> {
        self.build_at("")
    }

    /// Same as `build`, with error paths prefixed by `scope` (used when the
    /// schema is nested inside another one).
    pub(crate) fn build_at(self, scope: &str) -> Result<Schema, SchemaDefinitionError> {
        if self.name.trim().is_empty() {
            return Err(SchemaDefinitionError::EmptySchemaName);
        }

        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(SchemaDefinitionError::EmptyFieldName {
                    path: scope_path(scope),
                });
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaDefinitionError::DuplicateField {
                    path: field_path(scope, &field.name),
                });
            }
        }

        for (i, name) in self.required.iter().enumerate() {
            if name.is_empty() {
                return Err(SchemaDefinitionError::EmptyFieldName {
                    path: scope_path(scope),
                });
            }
            if self.required[..i].contains(name) {
                return Err(SchemaDefinitionError::DuplicateRequiredField {
                    path: field_path(scope, name),
                });
            }
        }

        for field in &self.fields {
            check_field(&field_path(scope, &field.name), &field.constraints)?;
        }

        Ok(Schema {
            name: self.name,
            required: self.required,
            fields: self.fields,
            strict: self.strict,
        })
    }
}

/// Rejects a constraint list that no value could ever satisfy.
fn check_field(path: &str, constraints: &[Constraint]) -> Result<(), SchemaDefinitionError> {
    let mut accepted = TypeSet::ANY;
    let mut accepted_items = TypeSet::ANY;
    let mut low = f64::NEG_INFINITY;
    let mut high = f64::INFINITY;

    for (i, constraint) in constraints.iter().enumerate() {
        if let Constraint::NumericRange { min, max } = constraint {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(SchemaDefinitionError::InvalidRange {
                    path: path.to_string(),
                    min: *min,
                    max: *max,
                });
            }
            low = low.max(*min);
            high = high.min(*max);
            if low > high {
                return Err(SchemaDefinitionError::ConflictingConstraints {
                    path: path.to_string(),
                    reason: "numeric ranges do not overlap".into(),
                });
            }
        }

        accepted = accepted.intersect(constraint.accepted());
        if accepted.is_empty() {
            return Err(SchemaDefinitionError::ConflictingConstraints {
                path: path.to_string(),
                reason: format!(
                    "'{}' is incompatible with {}",
                    constraint,
                    describe(&constraints[..i])
                ),
            });
        }

        if let Some(items) = constraint.accepted_items() {
            accepted_items = accepted_items.intersect(items);
            if accepted_items.is_empty() {
                return Err(SchemaDefinitionError::ConflictingConstraints {
                    path: path.to_string(),
                    reason: "array item constraints admit no common item type".into(),
                });
            }
        }
    }

    if accepted == TypeSet::INTEGER && low.ceil() > high.floor() {
        return Err(SchemaDefinitionError::ConflictingConstraints {
            path: path.to_string(),
            reason: format!("range [{}, {}] contains no integer", low, high),
        });
    }

    Ok(())
}

fn describe(constraints: &[Constraint]) -> String {
    let parts: Vec<String> = constraints.iter().map(|c| c.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Dotted path of a field inside a (possibly nested) schema scope
pub(crate) fn field_path(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

pub(crate) fn scope_path(scope: &str) -> String {
    if scope.is_empty() {
        "$root".to_string()
    } else {
        scope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review_schema() -> Schema {
        Schema::builder("review")
            .required(["review_id", "user_id", "rating"])
            .field("review_id", [Constraint::scalar(ValueKind::String)])
            .field("user_id", [Constraint::scalar(ValueKind::String)])
            .field(
                "rating",
                [
                    Constraint::scalar(ValueKind::Integer),
                    Constraint::range(1.0, 5.0),
                ],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_keeps_declaration_order() {
        let schema = Schema::builder("products")
            .required(["sku", "name"])
            .field("name", [Constraint::scalar(ValueKind::String)])
            .field("sku", [Constraint::scalar(ValueKind::String)])
            .field("reviews", [Constraint::array_of_subdocuments(review_schema())])
            .build()
            .unwrap();

        let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["name", "sku", "reviews"]);
        assert_eq!(schema.required(), ["sku", "name"]);
        assert!(!schema.is_strict());
    }

    #[test]
    fn test_required_field_may_be_untyped() {
        let schema = Schema::builder("notes").require("body").build().unwrap();
        assert!(schema.declares("body"));
        assert!(schema.field("body").is_none());
    }

    #[test]
    fn test_empty_schema_name_rejected() {
        let err = Schema::builder("  ").build().unwrap_err();
        assert_eq!(err, SchemaDefinitionError::EmptySchemaName);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::builder("s")
            .field("a", Vec::new())
            .field("a", [Constraint::scalar(ValueKind::String)])
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "DOCSHAPE_DUPLICATE_FIELD");
        assert_eq!(err.path(), Some("a"));
    }

    #[test]
    fn test_duplicate_required_rejected() {
        let err = Schema::builder("s")
            .required(["a", "b", "a"])
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "DOCSHAPE_DUPLICATE_REQUIRED_FIELD");
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = Schema::builder("s")
            .field("rating", [Constraint::range(5.0, 1.0)])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::InvalidRange { .. }));
    }

    #[test]
    fn test_nan_bound_rejected() {
        let err = Schema::builder("s")
            .field("x", [Constraint::at_least(f64::NAN)])
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "DOCSHAPE_INVALID_RANGE");
    }

    #[test]
    fn test_degenerate_range_allowed() {
        assert!(Schema::builder("s")
            .field("x", [Constraint::range(3.0, 3.0)])
            .build()
            .is_ok());
    }

    #[test]
    fn test_string_with_range_conflicts() {
        let err = Schema::builder("s")
            .field(
                "sku",
                [
                    Constraint::scalar(ValueKind::String),
                    Constraint::range(0.0, 10.0),
                ],
            )
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "DOCSHAPE_CONFLICTING_CONSTRAINTS");
        assert_eq!(err.path(), Some("sku"));
    }

    #[test]
    fn test_scalar_with_array_conflicts() {
        let err = Schema::builder("s")
            .field(
                "tags",
                [
                    Constraint::scalar(ValueKind::Boolean),
                    Constraint::array_of(ValueKind::String),
                ],
            )
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "DOCSHAPE_CONFLICTING_CONSTRAINTS");
    }

    #[test]
    fn test_integer_and_number_are_compatible() {
        assert!(Schema::builder("s")
            .field(
                "qty",
                [
                    Constraint::scalar(ValueKind::Number),
                    Constraint::scalar(ValueKind::Integer),
                    Constraint::at_least(0.0),
                ],
            )
            .build()
            .is_ok());
    }

    #[test]
    fn test_array_type_with_items_is_compatible() {
        assert!(Schema::builder("s")
            .field(
                "tags",
                [
                    Constraint::scalar(ValueKind::Array),
                    Constraint::array_of(ValueKind::String),
                ],
            )
            .build()
            .is_ok());
    }

    #[test]
    fn test_conflicting_item_kinds_rejected() {
        let err = Schema::builder("s")
            .field(
                "reviews",
                [
                    Constraint::array_of(ValueKind::String),
                    Constraint::array_of_subdocuments(review_schema()),
                ],
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::ConflictingConstraints { .. }));
    }

    #[test]
    fn test_disjoint_ranges_rejected() {
        let err = Schema::builder("s")
            .field("x", [Constraint::at_most(1.0), Constraint::at_least(2.0)])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("do not overlap"));
    }

    #[test]
    fn test_integer_range_without_integers_rejected() {
        let err = Schema::builder("s")
            .field(
                "x",
                [Constraint::scalar(ValueKind::Integer), Constraint::range(1.5, 1.9)],
            )
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "DOCSHAPE_CONFLICTING_CONSTRAINTS");
        assert!(err.to_string().contains("contains no integer"));

        // Integral points and open sides remain satisfiable
        for range in [Constraint::range(1.5, 2.0), Constraint::at_least(0.5)] {
            assert!(Schema::builder("s")
                .field("x", [Constraint::scalar(ValueKind::Integer), range])
                .build()
                .is_ok());
        }
        assert!(Schema::builder("s")
            .field("x", [Constraint::range(1.5, 1.9)])
            .build()
            .is_ok());
    }

    #[test]
    fn test_open_range_sides_not_serialized() {
        assert_eq!(
            serde_json::to_value(Constraint::at_least(0.0)).unwrap(),
            json!({"constraint": "numeric_range", "min": 0.0})
        );
        assert_eq!(
            serde_json::to_value(Constraint::range(1.0, 5.0)).unwrap(),
            json!({"constraint": "numeric_range", "min": 1.0, "max": 5.0})
        );
    }

    #[test]
    fn test_nested_errors_carry_scope() {
        let err = Schema::builder("review")
            .field("rating", [Constraint::range(9.0, 1.0)])
            .build_at("reviews.items")
            .unwrap_err();
        assert_eq!(err.path(), Some("reviews.items.rating"));
    }

    #[test]
    fn test_value_kind_matching() {
        assert!(ValueKind::Integer.matches(&json!(3)));
        assert!(!ValueKind::Integer.matches(&json!(3.5)));
        assert!(ValueKind::Number.matches(&json!(3)));
        assert!(ValueKind::Number.matches(&json!(3.5)));
        assert!(!ValueKind::String.matches(&json!(null)));
        assert!(ValueKind::Object.matches(&json!({})));
        assert!(ValueKind::Array.matches(&json!([])));
    }

    #[test]
    fn test_value_kind_aliases() {
        assert_eq!(ValueKind::parse("int"), Some(ValueKind::Integer));
        assert_eq!(ValueKind::parse("bool"), Some(ValueKind::Boolean));
        assert_eq!(ValueKind::parse("double"), Some(ValueKind::Number));
        assert_eq!(ValueKind::parse("objectId"), None);
    }

    #[test]
    fn test_observed_type_names() {
        assert_eq!(observed_type_name(&json!(null)), "null");
        assert_eq!(observed_type_name(&json!(1)), "integer");
        assert_eq!(observed_type_name(&json!(1.5)), "number");
        assert_eq!(observed_type_name(&json!([1])), "array");
    }

    #[test]
    fn test_constraint_display() {
        assert_eq!(Constraint::range(1.0, 5.0).to_string(), "range [1, 5]");
        assert_eq!(Constraint::array_of(ValueKind::String).to_string(), "array<string>");
        assert_eq!(
            Constraint::array_of_subdocuments(review_schema()).to_string(),
            "array<review>"
        );
    }
}
