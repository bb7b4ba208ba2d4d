//! JSON I/O handling for the CLI
//!
//! - Input: JSON documents, one per line (blank lines skipped)
//! - Output: one JSON object per line on stdout
//! - UTF-8 only

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Opens the document source: a file if given, else stdin
pub fn open_input(path: Option<&Path>) -> CliResult<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                CliError::io_error(format!("Failed to open {}: {}", path.display(), e))
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Write a success response
pub fn write_response<W: Write>(writer: &mut W, data: Value) -> CliResult<()> {
    write_line(
        writer,
        &json!({
            "status": "ok",
            "data": data
        }),
    )
}

/// Write an error response for one input line
pub fn write_error<W: Write>(
    writer: &mut W,
    line: usize,
    code: &str,
    message: &str,
) -> CliResult<()> {
    write_line(
        writer,
        &json!({
            "status": "error",
            "line": line,
            "code": code,
            "message": message
        }),
    )
}

/// Write one JSON value followed by a newline
pub fn write_line<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
