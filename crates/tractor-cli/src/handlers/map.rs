//! Map command handler

use super::utils::{ensure_single_stdin, load_context, load_document, Engine};
use crate::cli::MapArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde_json::Value;
use std::path::Path;
use tracing::instrument;
use tractor_core::{Mapping, Subject};

/// Handle the map command
#[instrument(skip(config, output), fields(subject = %args.subject.display(), mapping = %args.mapping.display()))]
pub fn handle_map(args: MapArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("map", &args.mapping.display().to_string());
    ensure_single_stdin([
        Some(args.subject.as_path()),
        Some(args.mapping.as_path()),
        args.context.as_deref(),
    ])?;

    let engine = Engine::from_config(config)?;
    let mapping = load_mapping(&args.mapping)?;
    let subject = Subject::from(load_document(&args.subject)?);
    let context = load_context(args.context.as_deref())?;

    output.info(&format!("Producing {} field(s)", mapping.len()))?;
    let document = engine.extractor.extract_fields(&subject, &mapping, &context)?;

    output.subject(&document)?;
    timer.finish();
    Ok(())
}

/// Parse a field mapping document
pub(super) fn load_mapping(path: &Path) -> Result<Mapping> {
    parse_mapping(path, load_document(path)?)
}

pub(super) fn parse_mapping(path: &Path, document: Value) -> Result<Mapping> {
    if !document.is_object() {
        return Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "a mapping of field names to {accessor, pipeline}".to_string(),
        });
    }
    // Marker and stage errors come back through serde as plain messages
    serde_json::from_value(document).map_err(|e| {
        Error::Core(
            tractor_core::Error::configuration(e.to_string()).with_origin(path.display().to_string()),
        )
    })
}
