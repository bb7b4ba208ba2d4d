//! CLI command implementations
//!
//! Every command loads its inputs up front and fails before producing
//! output if the configuration or any schema is invalid.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::observability::{log_event, Event, Logger, Severity};
use crate::schema::{load_schema_file, SchemaError, SchemaRegistry, SchemaValidator};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{open_input, write_error, write_line, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory of schema descriptors (required)
    pub schema_dir: String,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Validate every document strictly, whatever the schema says
    #[serde(default)]
    pub strict: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.schema_dir.trim().is_empty() {
            return Err(CliError::config_error("schema_dir must not be empty"));
        }

        if self.severity().is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error.",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Get schema directory as Path
    pub fn schema_path(&self) -> &Path {
        Path::new(&self.schema_dir)
    }

    /// Configured log threshold
    pub fn severity(&self) -> Option<Severity> {
        Severity::parse(&self.log_level).filter(|s| *s != Severity::Fatal)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Schemas { config } => schemas(&config),
        Command::Check { schema } => check(&schema),
        Command::Validate {
            config,
            schema,
            partial,
            input,
        } => validate(&config, &schema, partial, input.as_deref()),
    }
}

/// List the schemas the configured directory provides
pub fn schemas(config_path: &Path) -> CliResult<()> {
    let (_, registry) = boot(config_path)?;
    write_response(&mut io::stdout().lock(), json!({ "schemas": registry.names() }))
}

/// Build a single descriptor and print the schema it produces
pub fn check(schema_path: &Path) -> CliResult<()> {
    check_to(schema_path, &mut io::stdout().lock())
}

fn check_to<W: Write>(schema_path: &Path, writer: &mut W) -> CliResult<()> {
    let schema = load_schema_file(schema_path)?;
    write_response(writer, json!({ "schema": schema }))
}

/// Validate a stream of documents against one schema
///
/// Prints one report per document. Fails if any document was rejected.
pub fn validate(
    config_path: &Path,
    schema_name: &str,
    partial: bool,
    input: Option<&Path>,
) -> CliResult<()> {
    let (config, registry) = boot(config_path)?;
    if !registry.contains(schema_name) {
        return Err(SchemaError::UnknownSchema(schema_name.to_string()).into());
    }

    let validator = SchemaValidator::new(&registry).with_strict(config.strict);
    let reader = open_input(input)?;
    let summary = validate_stream(
        &validator,
        schema_name,
        partial,
        reader,
        &mut io::stdout().lock(),
    )?;

    if summary.rejected > 0 {
        return Err(CliError::documents_rejected(summary.rejected, summary.checked));
    }
    Ok(())
}

/// Counts from one validation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub checked: usize,
    pub rejected: usize,
}

/// Validates newline-delimited JSON documents from `reader`, writing one
/// line per document to `writer`.
///
/// Lines that are not JSON (including lines that are not UTF-8) are
/// reported as errors and count as rejected.
pub fn validate_stream<R: BufRead, W: Write>(
    validator: &SchemaValidator<'_>,
    schema_name: &str,
    partial: bool,
    reader: R,
    writer: &mut W,
) -> CliResult<StreamSummary> {
    let mut summary = StreamSummary::default();

    // Split on raw bytes so one undecodable line cannot end the stream
    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let line_no = index + 1;
        summary.checked += 1;

        let document: Value = match serde_json::from_slice(&line) {
            Ok(document) => document,
            Err(e) => {
                summary.rejected += 1;
                write_error(writer, line_no, "DOCSHAPE_CLI_INVALID_DOCUMENT", &e.to_string())?;
                continue;
            }
        };

        let report = if partial {
            validator.validate_update(schema_name, &document)?
        } else {
            validator.validate_document(schema_name, &document)?
        };

        let line_str = line_no.to_string();
        if report.is_ok() {
            log_event(
                Event::DocumentValidated,
                &[("line", line_str.as_str()), ("schema", schema_name)],
            );
        } else {
            summary.rejected += 1;
            let count = report.violations().len().to_string();
            log_event(
                Event::DocumentRejected,
                &[
                    ("line", line_str.as_str()),
                    ("schema", schema_name),
                    ("violations", count.as_str()),
                ],
            );
        }

        write_line(writer, &json!({ "line": line_no, "report": report }))?;
    }

    Ok(summary)
}

/// Load configuration, apply its log level and build the registry.
fn boot(config_path: &Path) -> CliResult<(Config, SchemaRegistry)> {
    let config = Config::load(config_path)?;
    if let Some(severity) = config.severity() {
        Logger::set_min_severity(severity);
    }

    let path = config_path.display().to_string();
    log_event(
        Event::ConfigLoaded,
        &[("path", path.as_str()), ("schema_dir", config.schema_dir.as_str())],
    );

    let mut registry = SchemaRegistry::new(config.schema_path());
    registry.load_all()?;
    Ok((config, registry))
}
