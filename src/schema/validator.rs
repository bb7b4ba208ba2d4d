//! Validation engine
//!
//! Validation semantics:
//! - Required fields must be present and non-null
//! - Present, non-null fields are checked against every listed constraint
//! - Array-of-subdocument items are validated recursively
//! - Undeclared fields are allowed unless the schema is strict
//!
//! Guarantees:
//! - Every violation is reported, never just the first
//! - Validation never fails; malformed documents produce violations
//! - Validation is a pure function of (schema, document)
//!
//! Violation order: required-field violations in `required` order, then
//! per-field violations in declared field order (depth-first through array
//! items), then unknown fields in document key order.

use serde_json::{Map, Number, Value};

use super::errors::{SchemaError, SchemaResult};
use super::registry::SchemaRegistry;
use super::report::{FieldPath, ValidationReport, Violation};
use super::types::{Constraint, Schema};

/// Options for a validation call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationMode {
    /// Skip required-field presence checks on the root document, for
    /// partial updates. Subdocuments are always checked completely.
    pub partial: bool,
    /// Treat every schema in the tree as strict
    pub force_strict: bool,
}

impl ValidationMode {
    pub fn partial() -> Self {
        Self {
            partial: true,
            ..Self::default()
        }
    }
}

/// Validates a complete document.
pub fn validate(schema: &Schema, document: &Value) -> ValidationReport {
    validate_with(schema, document, ValidationMode::default())
}

/// Validates a partial update: only the fields present are checked.
///
/// A required field explicitly set to null is still a violation, since
/// applying the update would clear it.
pub fn validate_partial(schema: &Schema, document: &Value) -> ValidationReport {
    validate_with(schema, document, ValidationMode::partial())
}

/// Validates a document with explicit options.
pub fn validate_with(schema: &Schema, document: &Value, mode: ValidationMode) -> ValidationReport {
    let mut walk = Walk {
        force_strict: mode.force_strict,
        violations: Vec::new(),
    };
    walk.document(schema, document, &FieldPath::root(), mode.partial);
    ValidationReport::from_violations(walk.violations)
}

impl Schema {
    /// Validates a complete document against this schema
    pub fn validate(&self, document: &Value) -> ValidationReport {
        validate(self, document)
    }
}

/// Per-call traversal state. Recursion follows the schema tree, so depth is
/// bounded by schema nesting regardless of document depth.
struct Walk {
    force_strict: bool,
    violations: Vec<Violation>,
}

impl Walk {
    fn document(&mut self, schema: &Schema, value: &Value, path: &FieldPath, partial: bool) {
        let Some(obj) = value.as_object() else {
            self.violations
                .push(Violation::type_mismatch(path.clone(), "object", value));
            return;
        };

        self.required(schema, obj, path, partial);

        for field in schema.fields() {
            match obj.get(field.name()) {
                Some(value) if !value.is_null() => {
                    let field_path = path.child(field.name());
                    for constraint in field.constraints() {
                        self.constraint(constraint, value, &field_path);
                    }
                }
                // Absent and null fields are the required check's concern
                _ => {}
            }
        }

        if schema.is_strict() || self.force_strict {
            for key in obj.keys() {
                if !schema.declares(key) {
                    self.violations
                        .push(Violation::unknown_field(path.child(key), schema.name()));
                }
            }
        }
    }

    fn required(
        &mut self,
        schema: &Schema,
        obj: &Map<String, Value>,
        path: &FieldPath,
        partial: bool,
    ) {
        for name in schema.required() {
            match obj.get(name) {
                None if !partial => {
                    self.violations.push(Violation::missing_field(path.child(name)))
                }
                Some(Value::Null) => self.violations.push(Violation::null_field(path.child(name))),
                _ => {}
            }
        }
    }

    fn constraint(&mut self, constraint: &Constraint, value: &Value, path: &FieldPath) {
        match constraint {
            Constraint::ScalarType { kind } => {
                if !kind.matches(value) {
                    self.violations
                        .push(Violation::type_mismatch(path.clone(), kind.type_name(), value));
                }
            }
            Constraint::NumericRange { min, max } => match value {
                Value::Number(n) => {
                    if !within(n, *min, *max) {
                        self.violations
                            .push(Violation::out_of_range(path.clone(), n, *min, *max));
                    }
                }
                _ => self
                    .violations
                    .push(Violation::type_mismatch(path.clone(), "number", value)),
            },
            Constraint::ArrayOfScalar { item_kind } => {
                let Some(items) = self.array(value, path) else {
                    return;
                };
                for (i, item) in items.iter().enumerate() {
                    if !item_kind.matches(item) {
                        self.violations.push(Violation::type_mismatch(
                            path.index(i),
                            item_kind.type_name(),
                            item,
                        ));
                    }
                }
            }
            Constraint::ArrayOfSubdocument { item_schema } => {
                let Some(items) = self.array(value, path) else {
                    return;
                };
                for (i, item) in items.iter().enumerate() {
                    self.document(item_schema, item, &path.index(i), false);
                }
            }
        }
    }

    /// Returns the array items, or records a mismatch
    fn array<'v>(&mut self, value: &'v Value, path: &FieldPath) -> Option<&'v Vec<Value>> {
        let items = value.as_array();
        if items.is_none() {
            self.violations
                .push(Violation::type_mismatch(path.clone(), "array", value));
        }
        items
    }
}

/// Inclusive range test. Integers are compared exactly against the
/// integral part of each bound, since large values do not fit an f64.
fn within(n: &Number, min: f64, max: f64) -> bool {
    let exact = n
        .as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from));

    match exact {
        // Float-to-int casts saturate, so infinite bounds stay open
        Some(i) => i >= min.ceil() as i128 && i <= max.floor() as i128,
        None => n.as_f64().map_or(false, |x| x >= min && x <= max),
    }
}

/// Validates documents against schemas looked up by name.
///
/// Only an unknown schema name is an error; document problems are always
/// returned as a report.
pub struct SchemaValidator<'a> {
    registry: &'a SchemaRegistry,
    force_strict: bool,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a new validator backed by the given registry.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            force_strict: false,
        }
    }

    /// Treats every schema as strict, whatever its own flag says.
    pub fn with_strict(mut self, force_strict: bool) -> Self {
        self.force_strict = force_strict;
        self
    }

    /// Validates a complete document (insert or replace).
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownSchema` if no schema has that name.
    pub fn validate_document(
        &self,
        schema_name: &str,
        document: &Value,
    ) -> SchemaResult<ValidationReport> {
        self.run(schema_name, document, false)
    }

    /// Validates a partial update (`$set`-style patch).
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownSchema` if no schema has that name.
    pub fn validate_update(
        &self,
        schema_name: &str,
        document: &Value,
    ) -> SchemaResult<ValidationReport> {
        self.run(schema_name, document, true)
    }

    fn run(
        &self,
        schema_name: &str,
        document: &Value,
        partial: bool,
    ) -> SchemaResult<ValidationReport> {
        let schema = self
            .registry
            .get(schema_name)
            .ok_or_else(|| SchemaError::UnknownSchema(schema_name.to_string()))?;

        let mode = ValidationMode {
            partial,
            force_strict: self.force_strict,
        };
        Ok(validate_with(schema, document, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::report::ViolationKind;
    use crate::schema::types::ValueKind;
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
            .field("comment", [Constraint::scalar(ValueKind::String)])
            .field("verified", [Constraint::scalar(ValueKind::Boolean)])
            .build()
            .unwrap()
    }

    fn product_schema() -> Schema {
        Schema::builder("products")
            .required(["sku", "name", "reviews"])
            .field("sku", [Constraint::scalar(ValueKind::String)])
            .field("name", [Constraint::scalar(ValueKind::String)])
            .field(
                "price",
                [Constraint::scalar(ValueKind::Number), Constraint::at_least(0.0)],
            )
            .field("tags", [Constraint::array_of(ValueKind::String)])
            .field("reviews", [Constraint::array_of_subdocuments(review_schema())])
            .build()
            .unwrap()
    }

    fn paths(report: &ValidationReport) -> Vec<String> {
        report.violations().iter().map(|v| v.path.to_string()).collect()
    }

    #[test]
    fn test_valid_document_passes() {
        let doc = json!({
            "sku": "SKU1001",
            "name": "Widget",
            "price": 19.99,
            "tags": ["tools"],
            "reviews": [
                {"review_id": "r1", "user_id": "u1", "rating": 5, "verified": true}
            ]
        });

        let report = validate(&product_schema(), &doc);
        assert!(report.is_ok());
        assert!(report.violations().is_empty());
    }

    #[test]
    fn test_out_of_range_rating_in_review() {
        let doc = json!({
            "sku": "X1",
            "name": "Widget",
            "reviews": [{"review_id": "r1", "user_id": "u1", "rating": 6}]
        });

        let report = validate(&product_schema(), &doc);
        assert_eq!(report.violations().len(), 1);
        let violation = &report.violations()[0];
        assert_eq!(violation.kind, ViolationKind::OutOfRange);
        assert_eq!(serde_json::to_value(&violation.path).unwrap(), json!(["reviews", 0, "rating"]));
    }

    #[test]
    fn test_missing_name() {
        let doc = json!({"sku": "X1", "reviews": []});

        let report = validate(&product_schema(), &doc);
        assert_eq!(report.violations().len(), 1);
        assert_eq!(report.violations()[0].kind, ViolationKind::MissingRequiredField);
        assert_eq!(paths(&report), ["name"]);
    }

    #[test]
    fn test_empty_reviews_valid() {
        let doc = json!({"sku": "X1", "name": "Widget", "reviews": []});
        assert!(validate(&product_schema(), &doc).is_ok());
    }

    #[test]
    fn test_null_required_field_reported_once() {
        let doc = json!({"sku": "X1", "name": null, "reviews": []});

        let report = validate(&product_schema(), &doc);
        assert_eq!(report.violations().len(), 1);
        assert_eq!(report.violations()[0].kind, ViolationKind::MissingRequiredField);
        assert_eq!(report.violations()[0].message, "required field is null");
    }

    #[test]
    fn test_null_optional_field_ignored() {
        let doc = json!({"sku": "X1", "name": "W", "price": null, "reviews": []});
        assert!(validate(&product_schema(), &doc).is_ok());
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let schema = review_schema();
        for rating in [1, 5] {
            let doc = json!({"review_id": "r", "user_id": "u", "rating": rating});
            assert!(validate(&schema, &doc).is_ok(), "rating {} should pass", rating);
        }
        for rating in [0, 6] {
            let doc = json!({"review_id": "r", "user_id": "u", "rating": rating});
            let report = validate(&schema, &doc);
            assert_eq!(report.count_of(ViolationKind::OutOfRange), 1);
        }
    }

    #[test]
    fn test_large_integers_compared_exactly() {
        let limit = 9_007_199_254_740_992u64; // 2^53
        let schema = Schema::builder("counter")
            .field(
                "n",
                [
                    Constraint::scalar(ValueKind::Integer),
                    Constraint::at_most(limit as f64),
                ],
            )
            .build()
            .unwrap();

        assert!(validate(&schema, &json!({"n": limit})).is_ok());
        let report = validate(&schema, &json!({"n": limit + 1}));
        assert_eq!(report.count_of(ViolationKind::OutOfRange), 1);
        let report = validate(&schema, &json!({"n": u64::MAX}));
        assert_eq!(report.count_of(ViolationKind::OutOfRange), 1);
        assert!(validate(&schema, &json!({"n": i64::MIN})).is_ok());
    }

    #[test]
    fn test_integer_against_fractional_bounds() {
        let schema = Schema::builder("t")
            .field("n", [Constraint::range(0.5, 2.5)])
            .build()
            .unwrap();

        assert!(validate(&schema, &json!({"n": 1})).is_ok());
        assert!(validate(&schema, &json!({"n": 2})).is_ok());
        assert!(validate(&schema, &json!({"n": 0.5})).is_ok());
        assert_eq!(validate(&schema, &json!({"n": 0})).count_of(ViolationKind::OutOfRange), 1);
        assert_eq!(validate(&schema, &json!({"n": 3})).count_of(ViolationKind::OutOfRange), 1);
    }

    #[test]
    fn test_fractional_value_against_integer_range() {
        let doc = json!({"review_id": "r", "user_id": "u", "rating": 4.5});
        let report = validate(&review_schema(), &doc);
        assert_eq!(report.violations().len(), 1);
        assert_eq!(report.violations()[0].message, "expected integer, got number");
    }

    #[test]
    fn test_constraints_evaluated_independently() {
        // "high" fails both the type check and the range's numeric check
        let doc = json!({"review_id": "r", "user_id": "u", "rating": "high"});
        let report = validate(&review_schema(), &doc);
        assert_eq!(report.count_of(ViolationKind::TypeMismatch), 2);
        assert_eq!(paths(&report), ["rating", "rating"]);
    }

    #[test]
    fn test_all_array_items_checked() {
        let doc = json!({
            "sku": "X1", "name": "W", "reviews": [],
            "tags": ["a", 1, "b", false]
        });
        let report = validate(&product_schema(), &doc);
        assert_eq!(paths(&report), ["tags[1]", "tags[3]"]);
        assert_eq!(report.violations()[1].message, "expected string, got boolean");
    }

    #[test]
    fn test_non_array_reported_once() {
        let doc = json!({"sku": "X1", "name": "W", "reviews": {"review_id": "r1"}});
        let report = validate(&product_schema(), &doc);
        assert_eq!(report.violations().len(), 1);
        assert_eq!(report.violations()[0].message, "expected array, got object");
    }

    #[test]
    fn test_non_object_review_item() {
        let doc = json!({"sku": "X1", "name": "W", "reviews": ["great", null]});
        let report = validate(&product_schema(), &doc);
        assert_eq!(paths(&report), ["reviews[0]", "reviews[1]"]);
        assert_eq!(report.violations()[1].message, "expected object, got null");
    }

    #[test]
    fn test_sibling_items_all_reported() {
        let review = |rating: i64| json!({"review_id": "r", "user_id": "u", "rating": rating});
        let doc = json!({
            "sku": "X1", "name": "W",
            "reviews": [review(9), review(3), review(0), review(4), {"rating": 2}]
        });

        let report = validate(&product_schema(), &doc);
        assert_eq!(
            paths(&report),
            [
                "reviews[0].rating",
                "reviews[2].rating",
                "reviews[4].review_id",
                "reviews[4].user_id",
            ]
        );
    }

    #[test]
    fn test_violation_order_required_first() {
        let doc = json!({"sku": 5, "reviews": []});
        let report = validate(&product_schema(), &doc);
        assert_eq!(paths(&report), ["name", "sku"]);
        assert_eq!(report.violations()[0].kind, ViolationKind::MissingRequiredField);
        assert_eq!(report.violations()[1].kind, ViolationKind::TypeMismatch);
    }

    #[test]
    fn test_unknown_fields_allowed_by_default() {
        let doc = json!({"sku": "X1", "name": "W", "reviews": [], "color": "red"});
        assert!(validate(&product_schema(), &doc).is_ok());
    }

    #[test]
    fn test_strict_schema_rejects_unknown_fields() {
        let schema = Schema::builder("strict")
            .require("id")
            .field("name", [Constraint::scalar(ValueKind::String)])
            .strict(true)
            .build()
            .unwrap();

        let doc = json!({"id": 1, "name": "n", "extra": true, "more": 0});
        let report = validate(&schema, &doc);
        assert_eq!(paths(&report), ["extra", "more"]);
        assert_eq!(report.count_of(ViolationKind::UnknownField), 2);
    }

    #[test]
    fn test_force_strict_reaches_subdocuments() {
        let doc = json!({
            "sku": "X1", "name": "W",
            "reviews": [{"review_id": "r", "user_id": "u", "rating": 3, "spam": 1}]
        });
        let mode = ValidationMode {
            force_strict: true,
            ..ValidationMode::default()
        };

        let report = validate_with(&product_schema(), &doc, mode);
        assert_eq!(paths(&report), ["reviews[0].spam"]);
    }

    #[test]
    fn test_non_object_root() {
        let report = validate(&product_schema(), &json!([1, 2]));
        assert_eq!(report.violations().len(), 1);
        assert!(report.violations()[0].path.is_root());
        assert_eq!(report.violations()[0].message, "expected object, got array");
    }

    #[test]
    fn test_partial_skips_absent_required_fields() {
        let report = validate_partial(&product_schema(), &json!({"price": 149.99}));
        assert!(report.is_ok());
    }

    #[test]
    fn test_partial_still_checks_present_fields() {
        let report = validate_partial(&product_schema(), &json!({"price": -1}));
        assert_eq!(report.count_of(ViolationKind::OutOfRange), 1);
        assert_eq!(report.violations()[0].message, "value -1 is below the minimum 0");
    }

    #[test]
    fn test_partial_rejects_clearing_required_field() {
        let report = validate_partial(&product_schema(), &json!({"name": null}));
        assert_eq!(paths(&report), ["name"]);
    }

    #[test]
    fn test_partial_checks_subdocuments_completely() {
        let doc = json!({"reviews": [{"review_id": "r"}]});
        let report = validate_partial(&product_schema(), &doc);
        assert_eq!(paths(&report), ["reviews[0].user_id", "reviews[0].rating"]);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let schema = product_schema();
        let doc = json!({"sku": 1, "name": [], "reviews": [{"rating": 7}]});
        let first = validate(&schema, &doc);
        for _ in 0..50 {
            assert_eq!(validate(&schema, &doc), first);
        }
    }

    #[test]
    fn test_document_not_mutated() {
        let doc = json!({"sku": "X1", "reviews": [{"rating": 0}]});
        let before = doc.clone();
        let _ = validate(&product_schema(), &doc);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_schema_validate_method() {
        let doc = json!({"sku": "X1", "name": "W", "reviews": []});
        assert_eq!(product_schema().validate(&doc), validate(&product_schema(), &doc));
    }

    #[test]
    fn test_registry_validator_unknown_schema() {
        let registry = SchemaRegistry::new("unused");
        let validator = SchemaValidator::new(&registry);

        let result = validator.validate_document("products", &json!({}));
        assert!(matches!(result, Err(SchemaError::UnknownSchema(name)) if name == "products"));
    }

    #[test]
    fn test_registry_validator_modes() {
        let mut registry = SchemaRegistry::new("unused");
        registry.register(product_schema()).unwrap();
        let validator = SchemaValidator::new(&registry);

        let patch = json!({"price": 10});
        assert!(!validator.validate_document("products", &patch).unwrap().is_ok());
        assert!(validator.validate_update("products", &patch).unwrap().is_ok());

        let strict = SchemaValidator::new(&registry).with_strict(true);
        let report = strict
            .validate_update("products", &json!({"colour": "red"}))
            .unwrap();
        assert_eq!(report.count_of(ViolationKind::UnknownField), 1);
    }
}
