//! CLI module for docshape
//!
//! Provides command-line interface for:
//! - schemas: List the schemas in the configured directory
//! - check: Build one descriptor and print the schema
//! - validate: Validate newline-delimited documents against a schema

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    check, run, run_command, schemas, validate, validate_stream, Config, StreamSummary,
};
pub use errors::{CliError, CliErrorCode, CliResult};
