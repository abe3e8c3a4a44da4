//! Tractor CLI - Command-line interface for declarative extraction
//!
//! This is the main entry point for the `tractor` binary, providing commands
//! for resolving accessors against documents, building field mappings and
//! checking pipeline definitions.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands, OutputFormat};
use colored::control;
use config::Config;
use error::{Error, Result};
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::io::{self, Write};
use std::process;
use tracing::instrument;

fn main() {
    // A missing .env file is not an error
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Refined once the configuration is loaded
    let mut format = cli.output.unwrap_or_default();
    let result = run(cli, &mut format);

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            let use_color = control::SHOULD_COLORIZE.should_colorize();
            report_error(&e, format, use_color, Box::new(io::stderr()));

            if e.should_show_help() && format == OutputFormat::Human {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
fn run(cli: Cli, format: &mut OutputFormat) -> Result<()> {
    let config = Config::load_with_file(cli.config.as_deref())?;
    *format = cli.output.unwrap_or(config.output.format);

    let use_color = cli.use_color() && config.output.color;
    control::set_override(use_color);

    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    execute(cli, &config, use_color)
}

/// Write a failure to `writer` in the selected output format
fn report_error(error: &Error, format: OutputFormat, use_color: bool, writer: Box<dyn Write>) {
    let mut errors = OutputWriter::with_writer(format, use_color, false, 0, writer);
    if let Err(e) = errors.error(error) {
        eprintln!("{}", error::format_error(error, use_color));
        tracing::warn!(error = %e, "could not format failure report");
    }
}

#[instrument(skip(cli, config), fields(command = ?cli.command))]
fn execute(cli: Cli, config: &Config, use_color: bool) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let format = cli.output.unwrap_or(config.output.format);
    let mut output = OutputWriter::new(format, use_color, cli.quiet, cli.verbosity_level());

    tracing::info!(
        command = ?cli.command,
        verbosity = output.verbosity(),
        format = ?format,
        "Executing command"
    );

    match cli.command {
        Commands::Extract(args) => handlers::handle_extract(args, config, &mut output),
        Commands::Map(args) => handlers::handle_map(args, config, &mut output),
        Commands::Check(args) => handlers::handle_check(args, config, &mut output),
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
///
/// `-v` flags override the configured level; environment variables override
/// both.
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut logging_config = if cli.verbosity_level() > 0 {
        LoggingConfig::from_verbosity(cli.verbosity_level())
    } else {
        config.logging.clone()
    };

    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::Value;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_failure_is_reported_as_json() {
        let dir = TempDir::new().unwrap();
        let subject = dir.path().join("order.json");
        std::fs::write(&subject, r#"{"user": {"name": "ann"}}"#).unwrap();

        let cli = Cli::parse_from([
            "tractor",
            "-q",
            "-o",
            "json",
            "extract",
            subject.to_str().unwrap(),
            "-a",
            "user.age",
        ]);
        let format = cli.output.unwrap_or_default();
        let err = execute(cli, &Config::default(), false).unwrap_err();
        assert_eq!(err.exit_code(), 20);

        let buffer = SharedBuffer::default();
        report_error(&err, format, false, Box::new(buffer.clone()));

        let written = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        let report: Value = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(report["kind"], "Extraction");
        assert!(report["messages"][0].as_str().unwrap().contains("age"));
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["tractor", "-vv", "check", "pipeline.yaml"]);
        assert_eq!(cli.verbosity_level(), 2);
        assert!(cli.output.is_none());

        let cli = Cli::parse_from(["tractor", "--quiet", "-o", "json", "map", "order.json", "-m", "fields.yaml"]);
        assert_eq!(cli.verbosity_level(), 0);
        assert_eq!(cli.output, Some(cli::OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Map(_)));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["tractor", "-q", "-v", "check", "pipeline.yaml"]);
        assert!(result.is_err());
    }
}
