//! CLI argument definitions using clap
//!
//! Commands:
//! - docshape schemas --config <path>
//! - docshape check --schema <file>
//! - docshape validate --config <path> --schema <name> [--partial] [--input <file>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docshape - recursive document-shape validation for document stores
#[derive(Parser, Debug)]
#[command(name = "docshape")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the schemas in the configured schema directory
    Schemas {
        /// Path to configuration file
        #[arg(long, default_value = "./docshape.json")]
        config: PathBuf,
    },

    /// Build one schema descriptor and print the resulting schema
    Check {
        /// Path to the descriptor file
        #[arg(long)]
        schema: PathBuf,
    },

    /// Validate JSON documents, one per line, against a named schema
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./docshape.json")]
        config: PathBuf,

        /// Name of the schema to validate against
        #[arg(long)]
        schema: String,

        /// Treat documents as partial updates (required fields not enforced)
        #[arg(long)]
        partial: bool,

        /// Read documents from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
