//! Schema registry loaded from disk at startup
//!
//! - One descriptor per `*.json` file in the schema directory
//! - Schema name comes from the descriptor, else the file stem
//! - Any malformed or contradictory descriptor aborts the load
//! - Registered schemas are immutable; reload swaps the whole set

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::observability::{log_event, Event};

use super::descriptor;
use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// Named, immutable schemas available for validation.
pub struct SchemaRegistry {
    /// Directory containing schema descriptor files
    schema_dir: PathBuf,
    /// Loaded schemas indexed by name
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    /// Creates an empty registry reading from `schema_dir`.
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            schemas: HashMap::new(),
        }
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every descriptor in the schema directory and adds it to the
    /// registry. Nothing is added unless every file builds.
    ///
    /// Returns the number of schemas loaded.
    pub fn load_all(&mut self) -> SchemaResult<usize> {
        let loaded = read_schema_dir(&self.schema_dir)?;

        if let Some(name) = loaded.keys().find(|name| self.schemas.contains_key(*name)) {
            return Err(SchemaError::AlreadyRegistered(name.clone()));
        }

        let count = loaded.len();
        self.schemas.extend(loaded);

        let count_str = count.to_string();
        let dir = self.schema_dir.display().to_string();
        log_event(
            Event::SchemasLoaded,
            &[("count", count_str.as_str()), ("dir", dir.as_str())],
        );
        Ok(count)
    }

    /// Rebuilds the registry from disk.
    ///
    /// The current schemas stay in place if any file fails to build.
    /// Schemas registered programmatically are dropped on success.
    pub fn reload(&mut self) -> SchemaResult<usize> {
        let loaded = read_schema_dir(&self.schema_dir)?;
        let count = loaded.len();
        self.schemas = loaded;

        let count_str = count.to_string();
        log_event(Event::SchemasReloaded, &[("count", count_str.as_str())]);
        Ok(count)
    }

    /// Registers a schema directly (for embedding or testing).
    pub fn register(&mut self, schema: Schema) -> SchemaResult<()> {
        if self.schemas.contains_key(schema.name()) {
            return Err(SchemaError::AlreadyRegistered(schema.name().to_string()));
        }

        log_event(Event::SchemaRegistered, &[("schema", schema.name())]);
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    /// Gets a schema by name.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Returns all schema names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Builds every descriptor in `dir`, in file name order.
fn read_schema_dir(dir: &Path) -> SchemaResult<HashMap<String, Schema>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        SchemaError::malformed(
            dir.display().to_string(),
            format!("Failed to read schema directory: {}", e),
        )
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            SchemaError::malformed(
                dir.display().to_string(),
                format!("Failed to read directory entry: {}", e),
            )
        })?;
        let path = entry.path();

        // Skip non-JSON files
        if path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        paths.push(path);
    }
    paths.sort();

    let mut schemas = HashMap::new();
    for path in paths {
        let schema = load_schema_file(&path).map_err(|e| {
            let path = path.display().to_string();
            log_event(Event::SchemaRejected, &[("code", e.code()), ("path", path.as_str())]);
            e
        })?;

        if schemas.contains_key(schema.name()) {
            return Err(SchemaError::AlreadyRegistered(schema.name().to_string()));
        }
        schemas.insert(schema.name().to_string(), schema);
    }

    Ok(schemas)
}

/// Loads and builds a single descriptor file.
pub fn load_schema_file(path: &Path) -> SchemaResult<Schema> {
    let content = fs::read_to_string(path).map_err(|e| {
        SchemaError::malformed(path.display().to_string(), format!("Failed to read file: {}", e))
    })?;

    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        SchemaError::malformed(path.display().to_string(), format!("Invalid JSON: {}", e))
    })?;

    let stem = path.file_stem().and_then(|s| s.to_str());
    descriptor::build_named(&value, stem).map_err(|source| SchemaError::Definition {
        path: path.display().to_string(),
        source,
    })
}
