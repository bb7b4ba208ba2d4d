//! Declarative schema descriptors
//!
//! Builds a [`Schema`] from static JSON configuration. Two spellings are
//! accepted:
//!
//! ```json
//! { "name": "products", "required": ["sku"],
//!   "fields": { "sku": { "type": "string" },
//!               "price": { "type": "number", "min": 0 },
//!               "tags": { "type": "array", "items": "string" } } }
//! ```
//!
//! and the document-store `$jsonSchema` form (`bsonType`, `properties`,
//! `minimum`/`maximum`, `additionalProperties: false`). Field order in the
//! descriptor is the order violations are reported in.

use serde_json::{Map, Value};

use super::errors::SchemaDefinitionError;
use super::types::{field_path, scope_path, Constraint, Schema, SchemaBuilder, ValueKind};

const WRAPPER_KEYWORDS: &[&str] = &["$jsonSchema", "name"];

const SCHEMA_KEYWORDS: &[&str] = &[
    "name",
    "title",
    "description",
    "type",
    "bsonType",
    "required",
    "fields",
    "properties",
    "strict",
    "additionalProperties",
];

const FIELD_KEYWORDS: &[&str] = &[
    "title",
    "description",
    "type",
    "bsonType",
    "min",
    "minimum",
    "max",
    "maximum",
    "items",
];

const ITEM_KEYWORDS: &[&str] = &["title", "description", "type", "bsonType"];

/// Builds a schema from a descriptor that names itself.
///
/// # Errors
///
/// Returns `SchemaDefinitionError` if the descriptor is malformed, uses a
/// keyword outside the supported vocabulary, or describes a contradictory
/// schema.
pub fn build(descriptor: &Value) -> Result<Schema, SchemaDefinitionError> {
    build_named(descriptor, None)
}

/// Builds a schema, using `fallback_name` when the descriptor carries no
/// `name` or `title`.
pub fn build_named(
    descriptor: &Value,
    fallback_name: Option<&str>,
) -> Result<Schema, SchemaDefinitionError> {
    let outer = as_object(descriptor, "")?;

    let (body, outer_name) = match outer.get("$jsonSchema") {
        Some(inner) => {
            check_keywords(outer, WRAPPER_KEYWORDS, "")?;
            (as_object(inner, "")?, string_keyword(outer, "name", "")?)
        }
        None => (outer, None),
    };

    let name = match outer_name {
        Some(name) => Some(name),
        None => schema_name(body, "")?,
    };
    let name = name.or(fallback_name).ok_or_else(|| invalid("", "schema has no name"))?;

    parse_schema(body, name, "")
}

/// Parses one schema body. `scope` is the dotted path of the enclosing
/// array's items, empty at the top level.
fn parse_schema(
    obj: &Map<String, Value>,
    name: &str,
    scope: &str,
) -> Result<Schema, SchemaDefinitionError> {
    check_keywords(obj, SCHEMA_KEYWORDS, scope)?;

    if let Some(kind) = type_keyword(obj, scope)? {
        if kind != "object" {
            return Err(invalid(scope, format!("schema type must be 'object', got '{}'", kind)));
        }
    }

    let mut builder = SchemaBuilder::new(name).strict(strict_flag(obj, scope)?);

    if let Some(required) = obj.get("required") {
        let list = required
            .as_array()
            .ok_or_else(|| invalid(scope, "'required' must be an array of field names"))?;
        for entry in list {
            let field = entry
                .as_str()
                .ok_or_else(|| invalid(scope, "'required' must be an array of field names"))?;
            builder = builder.require(field);
        }
    }

    let fields = match (obj.get("fields"), obj.get("properties")) {
        (Some(_), Some(_)) => {
            return Err(invalid(scope, "'fields' and 'properties' are mutually exclusive"))
        }
        (Some(fields), None) | (None, Some(fields)) => Some(fields),
        (None, None) => None,
    };
    if let Some(fields) = fields {
        let fields = fields
            .as_object()
            .ok_or_else(|| invalid(scope, "'fields' must map field names to descriptors"))?;
        for (field_name, descriptor) in fields {
            let constraints = parse_field(descriptor, &field_path(scope, field_name))?;
            builder = builder.field(field_name.as_str(), constraints);
        }
    }

    builder.build_at(scope)
}

/// Turns one field descriptor into its constraint list.
fn parse_field(descriptor: &Value, path: &str) -> Result<Vec<Constraint>, SchemaDefinitionError> {
    let obj = as_object(descriptor, path)?;
    check_keywords(obj, FIELD_KEYWORDS, path)?;

    let kind = match type_keyword(obj, path)? {
        Some(name) => Some(parse_kind(name, path)?),
        None => None,
    };
    let min = number_keyword(obj, "min", "minimum", path)?;
    let max = number_keyword(obj, "max", "maximum", path)?;
    let items = match obj.get("items") {
        Some(items) => Some(parse_items(items, &format!("{}.items", path))?),
        None => None,
    };

    let mut constraints = Vec::new();
    match (kind, &items) {
        // The array constraint already checks the value is an array
        (Some(ValueKind::Array), Some(_)) => {}
        (Some(kind), _) => constraints.push(Constraint::scalar(kind)),
        (None, _) => {}
    }
    if min.is_some() || max.is_some() {
        constraints.push(Constraint::range(
            min.unwrap_or(f64::NEG_INFINITY),
            max.unwrap_or(f64::INFINITY),
        ));
    }
    if let Some(items) = items {
        constraints.push(items);
    }

    Ok(constraints)
}

/// `items` is either a kind name, a `{type: kind}` object, or a nested
/// schema (anything declaring `fields`, `properties` or `required`).
fn parse_items(items: &Value, path: &str) -> Result<Constraint, SchemaDefinitionError> {
    match items {
        Value::String(name) => Ok(Constraint::array_of(parse_kind(name, path)?)),
        Value::Object(obj) => {
            let nested = ["fields", "properties", "required"]
                .iter()
                .any(|key| obj.contains_key(*key));
            if nested {
                let name = schema_name(obj, path)?.unwrap_or(path);
                let schema = parse_schema(obj, name, path)?;
                return Ok(Constraint::array_of_subdocuments(schema));
            }

            check_keywords(obj, ITEM_KEYWORDS, path)?;
            let kind = type_keyword(obj, path)?
                .ok_or_else(|| invalid(path, "items must name a type or declare fields"))?;
            Ok(Constraint::array_of(parse_kind(kind, path)?))
        }
        _ => Err(invalid(path, "items must be a type name or an object")),
    }
}

fn as_object<'v>(
    value: &'v Value,
    path: &str,
) -> Result<&'v Map<String, Value>, SchemaDefinitionError> {
    value
        .as_object()
        .ok_or_else(|| invalid(path, "descriptor must be a JSON object"))
}

fn check_keywords(
    obj: &Map<String, Value>,
    allowed: &[&str],
    path: &str,
) -> Result<(), SchemaDefinitionError> {
    match obj.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(keyword) => Err(SchemaDefinitionError::UnsupportedKeyword {
            path: scope_path(path),
            keyword: keyword.clone(),
        }),
        None => Ok(()),
    }
}

fn schema_name<'v>(
    obj: &'v Map<String, Value>,
    path: &str,
) -> Result<Option<&'v str>, SchemaDefinitionError> {
    match string_keyword(obj, "name", path)? {
        Some(name) => Ok(Some(name)),
        None => string_keyword(obj, "title", path),
    }
}

fn string_keyword<'v>(
    obj: &'v Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'v str>, SchemaDefinitionError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(invalid(path, format!("'{}' must be a string", key))),
    }
}

/// `type` or its alias `bsonType`; both at once is ambiguous.
fn type_keyword<'v>(
    obj: &'v Map<String, Value>,
    path: &str,
) -> Result<Option<&'v str>, SchemaDefinitionError> {
    match (string_keyword(obj, "type", path)?, string_keyword(obj, "bsonType", path)?) {
        (Some(_), Some(_)) => Err(invalid(path, "'type' and 'bsonType' are mutually exclusive")),
        (kind, None) | (None, kind) => Ok(kind),
    }
}

fn number_keyword(
    obj: &Map<String, Value>,
    key: &str,
    alias: &str,
    path: &str,
) -> Result<Option<f64>, SchemaDefinitionError> {
    let value = match (obj.get(key), obj.get(alias)) {
        (Some(_), Some(_)) => {
            return Err(invalid(path, format!("'{}' and '{}' are mutually exclusive", key, alias)))
        }
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => return Ok(None),
    };
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| invalid(path, format!("'{}' must be a number", key)))
}

/// `strict: true` or `additionalProperties: false`
fn strict_flag(obj: &Map<String, Value>, path: &str) -> Result<bool, SchemaDefinitionError> {
    let flag = |key: &str| match obj.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(invalid(path, format!("'{}' must be a boolean", key))),
    };

    match (flag("strict")?, flag("additionalProperties")?.map(|allowed| !allowed)) {
        (Some(a), Some(b)) if a != b => Err(invalid(
            path,
            "'strict' contradicts 'additionalProperties'",
        )),
        (Some(strict), _) | (None, Some(strict)) => Ok(strict),
        (None, None) => Ok(false),
    }
}

fn parse_kind(name: &str, path: &str) -> Result<ValueKind, SchemaDefinitionError> {
    ValueKind::parse(name).ok_or_else(|| SchemaDefinitionError::UnknownValueKind {
        path: scope_path(path),
        kind: name.to_string(),
    })
}

fn invalid(path: &str, reason: impl Into<String>) -> SchemaDefinitionError {
    SchemaDefinitionError::InvalidDescriptor {
        path: scope_path(path),
        reason: reason.into(),
    }
}
