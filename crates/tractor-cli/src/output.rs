//! Output formatting and writing utilities
//!
//! This module formats extracted subjects and engine error reports in the
//! configured format (JSON, YAML, human-readable) and writes them out.

use crate::cli::OutputFormat;
use crate::error::{format_error, stage_cause, Error, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, Write};
use tracing::{debug, trace};
use tractor_core::{ErrorReport, Subject};

/// Trait for formatting output with specialized support for engine types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format an extracted subject
    fn format_subject(&self, subject: &Subject) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // Human output of arbitrary data falls back to pretty JSON
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_subject(&self, subject: &Subject) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_subject_human(&subject.to_json())),
            _ => self.format(subject),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self::with_writer(format, use_color, quiet, verbose, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            verbose,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Get verbosity level
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!("Outputting data: {} bytes", formatted.len());
        self.emit(&formatted)
    }

    /// Write an extracted subject
    pub fn subject(&mut self, subject: &Subject) -> Result<()> {
        let formatted = self.format.format_subject(subject)?;
        self.emit(&formatted)
    }

    /// Write a failure
    ///
    /// Human output is the message block of [`format_error`]. Machine formats
    /// get the engine's [`ErrorReport`], keyed by the failing stage's own kind,
    /// or the message and exit code of any other failure.
    pub fn error(&mut self, error: &Error) -> Result<()> {
        let formatted = match (self.format, error) {
            (OutputFormat::Human, _) => format_error(error, self.use_color),
            (format, Error::Core(core)) => format.format(&error_report(core))?,
            (format, other) => format.format(&json!({
                "error": other.to_string(),
                "exit_code": other.exit_code(),
            }))?,
        };
        self.emit(&formatted)
    }

    /// Write a table (human format only)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let header_row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ");

        if self.use_color {
            self.writeln(header_row.trim_end().bold().to_string().as_str())?;
        } else {
            self.writeln(header_row.trim_end())?;
        }

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.writeln(&separator)?;

        for row in rows {
            let row_str = row
                .iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(width) => format!("{:width$}", cell, width = *width),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(row_str.trim_end())?;
        }

        Ok(())
    }

    // Machine formats are written as-is, human output gets a trailing newline
    fn emit(&mut self, formatted: &str) -> Result<()> {
        if self.format == OutputFormat::Human || self.format == OutputFormat::JsonPretty {
            self.writeln(formatted)
        } else if formatted.ends_with('\n') {
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }
}

/// Render a subject for reading
///
/// Scalars print bare, collections print as indented `key: value` lines.
fn format_subject_human(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => {
            let mut output = String::new();
            write_tree(value, 0, &mut output);
            output.truncate(output.trim_end().len());
            output
        }
        other => format_scalar(other),
    }
}

fn write_tree(value: &Value, depth: usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    let entries: Vec<(String, &Value)> = match value {
        Value::Array(items) => items.iter().map(|v| ("-".to_string(), v)).collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (format!("{}:", k), v)).collect(),
        _ => return,
    };

    if entries.is_empty() {
        let empty = if value.is_array() { "[]" } else { "{}" };
        output.push_str(&format!("{}{}\n", indent, empty));
        return;
    }

    for (label, child) in entries {
        match child {
            Value::Array(items) if !items.is_empty() => {
                output.push_str(&format!("{}{}\n", indent, label));
                write_tree(child, depth + 1, output);
            }
            Value::Object(map) if !map.is_empty() => {
                output.push_str(&format!("{}{}\n", indent, label));
                write_tree(child, depth + 1, output);
            }
            _ => output.push_str(&format!("{}{} {}\n", indent, label, format_value_compact(child))),
        }
    }
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => format_value_compact(other),
    }
}

/// Report of the failing stage's own error, keeping the wrapper's stage index
fn error_report(error: &tractor_core::Error) -> ErrorReport {
    let mut report = stage_cause(error).report();
    report.stage_index = error.stage_index();
    report
}

/// Format a JSON value in a compact, human-readable way
fn format_value_compact(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            if arr.len() <= 3 {
                format!(
                    "[{}]",
                    arr.iter().map(format_value_compact).collect::<Vec<_>>().join(", ")
                )
            } else {
                format!("[{} items]", arr.len())
            }
        }
        Value::Object(obj) => {
            if obj.len() <= 2 {
                let items: Vec<String> = obj
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, format_value_compact(v)))
                    .collect();
                format!("{{{}}}", items.join(", "))
            } else {
                format!("{{{} fields}}", obj.len())
            }
        }
    }
}
